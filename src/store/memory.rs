use crate::error::StoreError;
use crate::model::{Certificate, CertificateRecord};
use crate::store::CertificateRepository;

/// In-memory repository; the reference semantics for the durable one.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    certificates: Vec<Certificate>,
}

impl CertificateRepository for MemoryRepository {
    fn get_by_period(&self, year: u16, month: u8) -> Result<Option<Certificate>, StoreError> {
        Ok(self
            .certificates
            .iter()
            .find(|certificate| {
                certificate.target_year == year && certificate.target_month == month
            })
            .cloned())
    }

    fn get(&self, certificate_id: &str) -> Result<Option<Certificate>, StoreError> {
        Ok(self
            .certificates
            .iter()
            .find(|certificate| certificate.id == certificate_id)
            .cloned())
    }

    fn upsert(&mut self, certificate: &Certificate) -> Result<(), StoreError> {
        let slot = self.certificates.iter().position(|existing| {
            existing.target_year == certificate.target_year
                && existing.target_month == certificate.target_month
        });

        match slot {
            Some(index) => self.certificates[index] = certificate.clone(),
            None => self.certificates.push(certificate.clone()),
        }
        Ok(())
    }

    fn get_record(
        &self,
        certificate_id: &str,
        record_id: &str,
    ) -> Result<Option<CertificateRecord>, StoreError> {
        Ok(self
            .certificates
            .iter()
            .find(|certificate| certificate.id == certificate_id)
            .and_then(|certificate| {
                certificate
                    .records
                    .iter()
                    .find(|record| record.id == record_id)
            })
            .cloned())
    }

    fn update_record(
        &mut self,
        certificate_id: &str,
        record: &CertificateRecord,
        matched_count: usize,
        unmatched_count: usize,
    ) -> Result<(), StoreError> {
        let certificate = self
            .certificates
            .iter_mut()
            .find(|certificate| certificate.id == certificate_id)
            .ok_or_else(|| StoreError::CertificateNotFound(certificate_id.to_string()))?;

        let slot = certificate
            .records
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or_else(|| StoreError::RecordNotFound {
                certificate_id: certificate_id.to_string(),
                record_id: record.id.clone(),
            })?;

        *slot = record.clone();
        certificate.matched_count = matched_count;
        certificate.unmatched_count = unmatched_count;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Certificate>, StoreError> {
        Ok(self.certificates.clone())
    }
}
