use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::error::IngestError;
use crate::extract::layout::PdftotextExtractor;
use crate::inventory;
use crate::matching::MatchingEngine;
use crate::model::Certificate;
use crate::pipeline::{IngestOutcome, IngestPipeline};
use crate::store::{CertificateRepository, SqliteRepository};
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize)]
struct IngestReport {
    report_version: u32,
    generated_at: String,
    certificate_id: String,
    target_year: u16,
    target_month: u8,
    file_name: String,
    sha256: String,
    total_vehicles: usize,
    matched_count: usize,
    unmatched_count: usize,
    warnings: Vec<String>,
}

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();

    validate_upload(&args)?;
    let document = read_document(&args.pdf)?;

    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("certificates.sqlite"));
    let inventory_path = args
        .inventory_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("vehicle_inventory.json"));
    let report_path = args.report_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_report_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    let file_name = args
        .pdf
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", args.pdf.display()))?;
    let sha256 = sha256_file(&args.pdf)?;
    let fleet = inventory::load(&inventory_path)?;

    info!(
        pdf = %args.pdf.display(),
        year = args.year,
        month = args.month,
        active_vehicles = fleet.active.len(),
        archived_vehicles = fleet.archived.len(),
        "starting certificate ingest"
    );

    let extractor = PdftotextExtractor;
    let pipeline = IngestPipeline::new(&extractor);
    let IngestOutcome {
        records,
        mut warnings,
    } = pipeline.ingest(&document, &args.password)?;
    info!(records = records.len(), "extracted vehicle records");

    let certificate_id = Certificate::period_id(args.year, args.month);
    let outcome = MatchingEngine::default().link(
        &certificate_id,
        records,
        &fleet.active,
        &fleet.archived,
    );
    warnings.extend(outcome.warnings);

    let document_date = outcome
        .records
        .first()
        .map(|record| record.vehicle.document_date.clone())
        .unwrap_or_default();
    let mut certificate = Certificate {
        id: certificate_id,
        target_year: args.year,
        target_month: args.month,
        file_name: file_name.clone(),
        uploaded_at: now_utc_string(),
        document_date,
        total_vehicles: 0,
        matched_count: 0,
        unmatched_count: 0,
        records: outcome.records,
    };
    certificate.recount();

    let mut repository = SqliteRepository::open(&db_path)?;
    if let Some(existing) = repository.get_by_period(args.year, args.month)? {
        warn!(
            certificate_id = %existing.id,
            file = %existing.file_name,
            uploaded_at = %existing.uploaded_at,
            "replacing existing certificate for this period"
        );
    }
    repository.upsert(&certificate)?;

    for warning in &warnings {
        warn!(warning = %warning, "ingest warning");
    }

    let report = IngestReport {
        report_version: 1,
        generated_at: now_utc_string(),
        certificate_id: certificate.id.clone(),
        target_year: certificate.target_year,
        target_month: certificate.target_month,
        file_name,
        sha256,
        total_vehicles: certificate.total_vehicles,
        matched_count: certificate.matched_count,
        unmatched_count: certificate.unmatched_count,
        warnings,
    };
    write_json_pretty(&report_path, &report)?;
    info!(path = %report_path.display(), "wrote ingest report");

    info!(
        certificate_id = %certificate.id,
        matched = certificate.matched_count,
        unmatched = certificate.unmatched_count,
        "ingest completed"
    );

    Ok(())
}

/// Request validation runs before any parsing work.
fn validate_upload(args: &IngestArgs) -> Result<(), IngestError> {
    if !(1..=12).contains(&args.month) {
        return Err(IngestError::Validation(format!(
            "month must be between 1 and 12, got {}",
            args.month
        )));
    }
    if args.password.trim().is_empty() {
        return Err(IngestError::Validation(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<Vec<u8>, IngestError> {
    let metadata = fs::metadata(path).map_err(|err| {
        IngestError::Validation(format!("cannot read document {}: {err}", path.display()))
    })?;
    if metadata.len() > MAX_DOCUMENT_BYTES {
        return Err(IngestError::Validation(format!(
            "document exceeds the {} MiB cap: {}",
            MAX_DOCUMENT_BYTES / (1024 * 1024),
            path.display()
        )));
    }

    let bytes = fs::read(path).map_err(|err| {
        IngestError::Validation(format!("cannot read document {}: {err}", path.display()))
    })?;
    if !bytes.starts_with(b"%PDF") {
        return Err(IngestError::Validation(format!(
            "unsupported document type: {}",
            path.display()
        )));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args(month: u8, password: &str) -> IngestArgs {
        IngestArgs {
            cache_root: PathBuf::from(".cache/fleetcert"),
            pdf: PathBuf::from("certificate.pdf"),
            password: password.to_string(),
            year: 2026,
            month,
            inventory_path: None,
            db_path: None,
            report_path: None,
        }
    }

    #[test]
    fn month_outside_range_is_a_validation_error() {
        let err = validate_upload(&args(0, "secret")).expect_err("must fail");
        assert!(matches!(err, IngestError::Validation(_)));

        let err = validate_upload(&args(13, "secret")).expect_err("must fail");
        assert!(matches!(err, IngestError::Validation(_)));

        assert!(validate_upload(&args(12, "secret")).is_ok());
    }

    #[test]
    fn blank_password_is_a_validation_error() {
        let err = validate_upload(&args(3, "  ")).expect_err("must fail");
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn non_pdf_bytes_are_rejected_before_parsing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("certificate.pdf");
        fs::write(&path, b"not a pdf").expect("write");

        let err = read_document(&path).expect_err("must fail");
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn oversized_document_is_rejected_before_parsing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("certificate.pdf");
        let mut oversized = b"%PDF-1.7".to_vec();
        oversized.resize(MAX_DOCUMENT_BYTES as usize + 1, 0);
        fs::write(&path, &oversized).expect("write");

        let err = read_document(&path).expect_err("must fail");
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn pdf_magic_passes_the_type_check() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("certificate.pdf");
        fs::write(&path, b"%PDF-1.7 ...").expect("write");

        let bytes = read_document(&path).expect("must pass");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
