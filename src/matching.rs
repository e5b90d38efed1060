use std::collections::HashMap;

use tracing::debug;

use crate::model::{CertificateRecord, MatchStatus, ParsedVehicleRecord, Vehicle};

/// One deterministic linkage strategy over a candidate pool.
pub trait Matcher {
    fn name(&self) -> &'static str;

    fn try_match<'a>(
        &self,
        record: &ParsedVehicleRecord,
        pool: &'a [Vehicle],
    ) -> Option<&'a Vehicle>;
}

pub struct RegistrationNumberMatcher;

impl Matcher for RegistrationNumberMatcher {
    fn name(&self) -> &'static str {
        "registration_number"
    }

    fn try_match<'a>(
        &self,
        record: &ParsedVehicleRecord,
        pool: &'a [Vehicle],
    ) -> Option<&'a Vehicle> {
        let key = normalize_key(&record.registration_number);
        if key.is_empty() {
            return None;
        }
        pool.iter()
            .find(|vehicle| normalize_key(&vehicle.registration_number) == key)
    }
}

pub struct FrameNumberMatcher;

impl Matcher for FrameNumberMatcher {
    fn name(&self) -> &'static str {
        "frame_number"
    }

    fn try_match<'a>(
        &self,
        record: &ParsedVehicleRecord,
        pool: &'a [Vehicle],
    ) -> Option<&'a Vehicle> {
        let key = normalize_key(&record.frame_number);
        if key.is_empty() {
            return None;
        }
        pool.iter()
            .find(|vehicle| normalize_key(&vehicle.frame_number) == key)
    }
}

pub struct MatchOutcome {
    pub records: Vec<CertificateRecord>,
    pub matched_count: usize,
    pub unmatched_count: usize,
    /// Many-to-one links are allowed but flagged for the reviewer.
    pub warnings: Vec<String>,
}

/// Runs the matcher list over the active pool, then the archived pool.
/// A wrong automatic link is worse than a manual review, so there is no
/// fuzzy fallback: a record either matches exactly or stays unmatched.
pub struct MatchingEngine {
    matchers: Vec<Box<dyn Matcher>>,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self {
            matchers: vec![
                Box::new(RegistrationNumberMatcher),
                Box::new(FrameNumberMatcher),
            ],
        }
    }
}

impl MatchingEngine {
    pub fn link(
        &self,
        certificate_id: &str,
        records: Vec<ParsedVehicleRecord>,
        active: &[Vehicle],
        archived: &[Vehicle],
    ) -> MatchOutcome {
        let pools: [(&[Vehicle], bool); 2] = [(active, false), (archived, true)];

        let mut linked = Vec::with_capacity(records.len());
        let mut first_link: HashMap<String, String> = HashMap::new();
        let mut warnings = Vec::new();

        for (index, vehicle) in records.into_iter().enumerate() {
            let mut record = CertificateRecord {
                id: format!("{certificate_id}-r{:03}", index + 1),
                vehicle,
                bike_id: None,
                bike_name: String::new(),
                match_status: MatchStatus::Unmatched,
                is_archived: false,
            };

            'pools: for (pool, from_archived) in pools {
                for matcher in &self.matchers {
                    if let Some(hit) = matcher.try_match(&record.vehicle, pool) {
                        debug!(
                            record_id = %record.id,
                            matcher = matcher.name(),
                            bike_id = %hit.id,
                            archived = from_archived,
                            "record matched"
                        );
                        record.bike_id = Some(hit.id.clone());
                        record.bike_name = hit.name.clone();
                        record.match_status = MatchStatus::AutoMatched;
                        record.is_archived = from_archived;
                        break 'pools;
                    }
                }
            }

            if let Some(bike_id) = &record.bike_id {
                match first_link.get(bike_id) {
                    Some(previous) => warnings.push(format!(
                        "records {previous} and {} both matched vehicle {bike_id}",
                        record.id
                    )),
                    None => {
                        first_link.insert(bike_id.clone(), record.id.clone());
                    }
                }
            }

            linked.push(record);
        }

        let matched_count = linked
            .iter()
            .filter(|record| record.match_status.is_matched())
            .count();
        let unmatched_count = linked.len() - matched_count;

        MatchOutcome {
            records: linked,
            matched_count,
            unmatched_count,
            warnings,
        }
    }
}

/// Case- and whitespace-insensitive comparison key. Full-width ASCII is
/// folded to half-width; insurer documents mix both for the same plate.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|character| !character.is_whitespace())
        .map(fold_fullwidth)
        .flat_map(char::to_uppercase)
        .collect()
}

fn fold_fullwidth(character: char) -> char {
    match character {
        '\u{ff01}'..='\u{ff5e}' => {
            char::from_u32(character as u32 - 0xfee0).unwrap_or(character)
        }
        _ => character,
    }
}
