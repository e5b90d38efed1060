use serde::{Deserialize, Serialize};

/// One glyph run on a page as reported by the document extractor, with
/// coordinates rounded to integer page units. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedFragment {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

pub type PageFragments = Vec<PositionedFragment>;

/// One vehicle as extracted from a page pair of the insurer document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedVehicleRecord {
    pub detail_number: String,
    pub vehicle_owner: String,
    pub vehicle_name: String,
    pub registration_number: String,
    pub frame_number: String,
    pub model_spec: String,
    pub first_registration: String,
    /// Legitimately empty for small-displacement vehicles.
    pub inspection_expiry: String,
    pub usage_vehicle_type: String,
    pub is_electric_vehicle: bool,
    pub is_hybrid: bool,
    pub is_aeb: bool,
    /// Issuing date, read from the companion page of the pair.
    pub document_date: String,
    pub page_start: u32,
    pub page_end: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    AutoMatched,
    ManualMatched,
    Unmatched,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutoMatched => "auto_matched",
            Self::ManualMatched => "manual_matched",
            Self::Unmatched => "unmatched",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto_matched" => Some(Self::AutoMatched),
            "manual_matched" => Some(Self::ManualMatched),
            "unmatched" => Some(Self::Unmatched),
            _ => None,
        }
    }

    pub fn is_matched(self) -> bool {
        !matches!(self, Self::Unmatched)
    }
}

/// Extracted record plus its linkage into the vehicle inventory.
/// `match_status == Unmatched` holds exactly when `bike_id` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub id: String,
    #[serde(flatten)]
    pub vehicle: ParsedVehicleRecord,
    pub bike_id: Option<String>,
    pub bike_name: String,
    pub match_status: MatchStatus,
    /// True when `bike_id` resolves into the archived fleet.
    pub is_archived: bool,
}

/// Persisted result of ingesting one insurer document for one period.
/// At most one certificate exists per (target_year, target_month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String,
    pub target_year: u16,
    pub target_month: u8,
    pub file_name: String,
    pub uploaded_at: String,
    pub document_date: String,
    pub total_vehicles: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub records: Vec<CertificateRecord>,
}

impl Certificate {
    pub fn period_id(year: u16, month: u8) -> String {
        format!("cert-{year:04}{month:02}")
    }

    /// Derived counts are never hand-set; recompute them from the record set.
    pub fn recount(&mut self) {
        self.total_vehicles = self.records.len();
        self.matched_count = self
            .records
            .iter()
            .filter(|record| record.match_status.is_matched())
            .count();
        self.unmatched_count = self.total_vehicles - self.matched_count;
    }
}

/// Read-only view of one inventory vehicle, the shape matching needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    pub registration_number: String,
    pub frame_number: String,
}
