use tracing::debug;

use crate::extract::fields::{LayoutProfile, field, find_flag, find_value};
use crate::model::{PageFragments, ParsedVehicleRecord};

/// Which page of each group contributes which fields. The insurer document
/// uses two pages per vehicle: the detail page, then a date-only companion.
#[derive(Debug, Clone, Copy)]
pub struct PagePairing {
    pub pages_per_record: usize,
    pub detail_page: usize,
    pub date_page: usize,
}

impl Default for PagePairing {
    fn default() -> Self {
        Self {
            pages_per_record: 2,
            detail_page: 0,
            date_page: 1,
        }
    }
}

/// Walks the page list in pairing-sized steps and emits one record per group,
/// in page order. A trailing detail page with no companion still yields a
/// record; its document date stays empty (degraded extraction, not failure).
pub fn assemble(
    pages: &[PageFragments],
    profile: &LayoutProfile,
    pairing: PagePairing,
) -> Vec<ParsedVehicleRecord> {
    let step = pairing.pages_per_record.max(1);
    let mut records = Vec::new();
    let mut index = 0;

    while index < pages.len() {
        let group = &pages[index..pages.len().min(index + step)];

        if let Some(detail) = group.get(pairing.detail_page) {
            let page_start = (index + 1) as u32;
            let mut record = ParsedVehicleRecord {
                page_start,
                page_end: page_start + 1,
                ..ParsedVehicleRecord::default()
            };

            for spec in profile.fields {
                let value = find_value(detail, spec.label, spec.y_tolerance, spec.x_max);
                assign_field(&mut record, spec.name, value);
            }

            for spec in profile.flags {
                let present = find_flag(
                    detail,
                    spec.label,
                    spec.y_tolerance,
                    spec.x_band,
                    profile.present_marker,
                );
                assign_flag(&mut record, spec.name, present);
            }

            if let Some(companion) = group.get(pairing.date_page) {
                let date = profile.date_field;
                record.document_date =
                    find_value(companion, date.label, date.y_tolerance, date.x_max);
            }

            records.push(record);
        }

        index += step;
    }

    debug!(pages = pages.len(), records = records.len(), "assembled vehicle records");
    records
}

fn assign_field(record: &mut ParsedVehicleRecord, name: &str, value: String) {
    match name {
        field::DETAIL_NUMBER => record.detail_number = value,
        field::VEHICLE_OWNER => record.vehicle_owner = value,
        field::VEHICLE_NAME => record.vehicle_name = value,
        field::REGISTRATION_NUMBER => record.registration_number = value,
        field::FRAME_NUMBER => record.frame_number = value,
        field::MODEL_SPEC => record.model_spec = value,
        field::FIRST_REGISTRATION => record.first_registration = value,
        field::INSPECTION_EXPIRY => record.inspection_expiry = value,
        field::USAGE_VEHICLE_TYPE => record.usage_vehicle_type = value,
        field::DOCUMENT_DATE => record.document_date = value,
        other => debug!(field = other, "layout profile names an unknown field"),
    }
}

fn assign_flag(record: &mut ParsedVehicleRecord, name: &str, present: bool) {
    match name {
        field::IS_ELECTRIC_VEHICLE => record.is_electric_vehicle = present,
        field::IS_HYBRID => record.is_hybrid = present,
        field::IS_AEB => record.is_aeb = present,
        other => debug!(flag = other, "layout profile names an unknown flag"),
    }
}
