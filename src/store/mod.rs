#[cfg(test)]
mod memory;
mod sqlite;


#[cfg(test)]
pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

use crate::error::StoreError;
use crate::inventory::VehicleInventoryManifest;
use crate::model::{Certificate, CertificateRecord, MatchStatus};

/// Keyed certificate collection with replace-on-period semantics. Nothing in
/// the pipeline touches storage except through this interface.
pub trait CertificateRepository {
    fn get_by_period(&self, year: u16, month: u8) -> Result<Option<Certificate>, StoreError>;

    fn get(&self, certificate_id: &str) -> Result<Option<Certificate>, StoreError>;

    /// Replaces any certificate already stored for the same period. Last
    /// upload for a period wins; there are no merge semantics.
    fn upsert(&mut self, certificate: &Certificate) -> Result<(), StoreError>;

    fn get_record(
        &self,
        certificate_id: &str,
        record_id: &str,
    ) -> Result<Option<CertificateRecord>, StoreError>;

    /// Writes one record plus the recomputed counts on its parent.
    fn update_record(
        &mut self,
        certificate_id: &str,
        record: &CertificateRecord,
        matched_count: usize,
        unmatched_count: usize,
    ) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<Certificate>, StoreError>;
}

/// Manual operator override: redirect one record's linkage. This is the only
/// path to `manual_matched`, and it never reverts a record to unmatched; a
/// wrong link is corrected by relinking to a different target.
pub fn relink_record(
    repository: &mut dyn CertificateRepository,
    inventory: &VehicleInventoryManifest,
    certificate_id: &str,
    record_id: &str,
    bike_id: &str,
) -> Result<CertificateRecord, StoreError> {
    let (vehicle, from_archived) = inventory
        .find(bike_id)
        .ok_or_else(|| StoreError::VehicleNotFound(bike_id.to_string()))?;

    let mut certificate = repository
        .get(certificate_id)?
        .ok_or_else(|| StoreError::CertificateNotFound(certificate_id.to_string()))?;

    let record = certificate
        .records
        .iter_mut()
        .find(|record| record.id == record_id)
        .ok_or_else(|| StoreError::RecordNotFound {
            certificate_id: certificate_id.to_string(),
            record_id: record_id.to_string(),
        })?;

    record.bike_id = Some(vehicle.id.clone());
    record.bike_name = vehicle.name.clone();
    record.match_status = MatchStatus::ManualMatched;
    record.is_archived = from_archived;
    let updated = record.clone();

    certificate.recount();
    repository.update_record(
        certificate_id,
        &updated,
        certificate.matched_count,
        certificate.unmatched_count,
    )?;

    Ok(updated)
}
