use std::collections::HashSet;

use tracing::debug;

use crate::error::IngestError;
use crate::extract::assemble::{PagePairing, assemble};
use crate::extract::fields::LayoutProfile;
use crate::extract::layout::DocumentExtractor;
use crate::model::ParsedVehicleRecord;

#[derive(Debug)]
pub struct IngestOutcome {
    pub records: Vec<ParsedVehicleRecord>,
    /// Non-fatal, human-readable. Accompanies a successful result.
    pub warnings: Vec<String>,
}

/// Drives decrypt → extract → assemble → validate for one uploaded document.
pub struct IngestPipeline<'a> {
    extractor: &'a dyn DocumentExtractor,
    profile: LayoutProfile,
    pairing: PagePairing,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(extractor: &'a dyn DocumentExtractor) -> Self {
        Self {
            extractor,
            profile: LayoutProfile::insurer_default(),
            pairing: PagePairing::default(),
        }
    }

    pub fn ingest(
        &self,
        document: &[u8],
        password: &str,
    ) -> Result<IngestOutcome, IngestError> {
        let pages = self.extractor.extract(document, password)?;
        debug!(pages = pages.len(), "document decrypted");

        let records = assemble(&pages, &self.profile, self.pairing);
        if records.is_empty() {
            return Err(IngestError::EmptyExtraction);
        }

        let warnings = validate_records(&records);
        Ok(IngestOutcome { records, warnings })
    }
}

const MANDATORY_FIELDS: [&str; 3] = ["vehicle_name", "registration_number", "frame_number"];

/// A missing mandatory field keeps the record and yields one warning per
/// field. Duplicate detail numbers within one document are warned the same
/// way; the document's own numbering is supposed to be unique per upload.
fn validate_records(records: &[ParsedVehicleRecord]) -> Vec<String> {
    let mut warnings = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let values = [
            &record.vehicle_name,
            &record.registration_number,
            &record.frame_number,
        ];
        for (field, value) in MANDATORY_FIELDS.iter().zip(values) {
            if value.trim().is_empty() {
                warnings.push(format!(
                    "record {} (page {}): missing mandatory field {}",
                    index + 1,
                    record.page_start,
                    field
                ));
            }
        }
    }

    let mut seen = HashSet::new();
    for record in records {
        let detail = record.detail_number.trim();
        if detail.is_empty() {
            continue;
        }
        if !seen.insert(detail.to_string()) {
            warnings.push(format!(
                "duplicate detail number {} appears again on page {}",
                detail, record.page_start
            ));
        }
    }

    warnings
}
