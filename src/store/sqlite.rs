use std::path::Path;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql, params};

use crate::error::StoreError;
use crate::model::{Certificate, CertificateRecord, MatchStatus, ParsedVehicleRecord};
use crate::store::CertificateRepository;

/// Durable repository over sqlite. One row per certificate, one row per
/// record; counts are stored denormalized but always recomputed before write.
pub struct SqliteRepository {
    connection: Connection,
}

impl SqliteRepository {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let connection = Connection::open(path)?;
        connection.pragma_update(None, "journal_mode", "WAL")?;
        connection.pragma_update(None, "synchronous", "NORMAL")?;
        Self::initialize(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(connection: Connection) -> Result<Self, StoreError> {
        connection.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS certificates (
              certificate_id TEXT PRIMARY KEY,
              target_year INTEGER NOT NULL,
              target_month INTEGER NOT NULL,
              file_name TEXT NOT NULL,
              uploaded_at TEXT NOT NULL,
              document_date TEXT NOT NULL,
              total_vehicles INTEGER NOT NULL,
              matched_count INTEGER NOT NULL,
              unmatched_count INTEGER NOT NULL,
              UNIQUE(target_year, target_month)
            );

            CREATE TABLE IF NOT EXISTS certificate_records (
              record_id TEXT PRIMARY KEY,
              certificate_id TEXT NOT NULL,
              detail_number TEXT NOT NULL,
              vehicle_owner TEXT NOT NULL,
              vehicle_name TEXT NOT NULL,
              registration_number TEXT NOT NULL,
              frame_number TEXT NOT NULL,
              model_spec TEXT NOT NULL,
              first_registration TEXT NOT NULL,
              inspection_expiry TEXT NOT NULL,
              usage_vehicle_type TEXT NOT NULL,
              is_electric_vehicle INTEGER NOT NULL,
              is_hybrid INTEGER NOT NULL,
              is_aeb INTEGER NOT NULL,
              document_date TEXT NOT NULL,
              page_start INTEGER NOT NULL,
              page_end INTEGER NOT NULL,
              bike_id TEXT,
              bike_name TEXT NOT NULL,
              match_status TEXT NOT NULL,
              is_archived INTEGER NOT NULL,
              FOREIGN KEY(certificate_id) REFERENCES certificates(certificate_id)
            );

            CREATE INDEX IF NOT EXISTS idx_records_certificate
              ON certificate_records(certificate_id);
            ",
        )?;

        Ok(Self { connection })
    }

    fn load_records(&self, certificate_id: &str) -> Result<Vec<CertificateRecord>, StoreError> {
        let mut statement = self.connection.prepare(
            "SELECT record_id, detail_number, vehicle_owner, vehicle_name,
                    registration_number, frame_number, model_spec, first_registration,
                    inspection_expiry, usage_vehicle_type, is_electric_vehicle,
                    is_hybrid, is_aeb, document_date, page_start, page_end,
                    bike_id, bike_name, match_status, is_archived
             FROM certificate_records
             WHERE certificate_id = ?1
             ORDER BY page_start, record_id",
        )?;

        let rows = statement.query_map(params![certificate_id], |row| {
            Ok(CertificateRecord {
                id: row.get(0)?,
                vehicle: ParsedVehicleRecord {
                    detail_number: row.get(1)?,
                    vehicle_owner: row.get(2)?,
                    vehicle_name: row.get(3)?,
                    registration_number: row.get(4)?,
                    frame_number: row.get(5)?,
                    model_spec: row.get(6)?,
                    first_registration: row.get(7)?,
                    inspection_expiry: row.get(8)?,
                    usage_vehicle_type: row.get(9)?,
                    is_electric_vehicle: row.get(10)?,
                    is_hybrid: row.get(11)?,
                    is_aeb: row.get(12)?,
                    document_date: row.get(13)?,
                    page_start: row.get(14)?,
                    page_end: row.get(15)?,
                },
                bike_id: row.get(16)?,
                bike_name: row.get(17)?,
                match_status: row.get(18)?,
                is_archived: row.get(19)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn load_certificate(
        &self,
        sql: &str,
        binding: &[&dyn ToSql],
    ) -> Result<Option<Certificate>, StoreError> {
        let header = self
            .connection
            .query_row(sql, binding, |row| {
                Ok(Certificate {
                    id: row.get(0)?,
                    target_year: row.get(1)?,
                    target_month: row.get(2)?,
                    file_name: row.get(3)?,
                    uploaded_at: row.get(4)?,
                    document_date: row.get(5)?,
                    total_vehicles: row.get::<_, i64>(6)? as usize,
                    matched_count: row.get::<_, i64>(7)? as usize,
                    unmatched_count: row.get::<_, i64>(8)? as usize,
                    records: Vec::new(),
                })
            })
            .optional()?;

        let Some(mut certificate) = header else {
            return Ok(None);
        };
        certificate.records = self.load_records(&certificate.id)?;
        Ok(Some(certificate))
    }
}

const CERTIFICATE_COLUMNS: &str = "certificate_id, target_year, target_month, file_name,
     uploaded_at, document_date, total_vehicles, matched_count, unmatched_count";

impl CertificateRepository for SqliteRepository {
    fn get_by_period(&self, year: u16, month: u8) -> Result<Option<Certificate>, StoreError> {
        let sql = format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates
             WHERE target_year = ?1 AND target_month = ?2"
        );
        self.load_certificate(&sql, &[&year, &month])
    }

    fn get(&self, certificate_id: &str) -> Result<Option<Certificate>, StoreError> {
        let sql = format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE certificate_id = ?1"
        );
        self.load_certificate(&sql, &[&certificate_id])
    }

    fn upsert(&mut self, certificate: &Certificate) -> Result<(), StoreError> {
        let tx = self.connection.transaction()?;

        // Replace wholesale: one certificate per period, last upload wins.
        tx.execute(
            "DELETE FROM certificate_records WHERE certificate_id IN
               (SELECT certificate_id FROM certificates
                WHERE target_year = ?1 AND target_month = ?2)",
            params![certificate.target_year, certificate.target_month],
        )?;
        tx.execute(
            "DELETE FROM certificates WHERE target_year = ?1 AND target_month = ?2",
            params![certificate.target_year, certificate.target_month],
        )?;

        tx.execute(
            "INSERT INTO certificates (certificate_id, target_year, target_month,
               file_name, uploaded_at, document_date, total_vehicles,
               matched_count, unmatched_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                certificate.id,
                certificate.target_year,
                certificate.target_month,
                certificate.file_name,
                certificate.uploaded_at,
                certificate.document_date,
                certificate.total_vehicles as i64,
                certificate.matched_count as i64,
                certificate.unmatched_count as i64,
            ],
        )?;

        for record in &certificate.records {
            tx.execute(
                "INSERT INTO certificate_records (record_id, certificate_id,
                   detail_number, vehicle_owner, vehicle_name, registration_number,
                   frame_number, model_spec, first_registration, inspection_expiry,
                   usage_vehicle_type, is_electric_vehicle, is_hybrid, is_aeb,
                   document_date, page_start, page_end, bike_id, bike_name,
                   match_status, is_archived)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                         ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
                params![
                    record.id,
                    certificate.id,
                    record.vehicle.detail_number,
                    record.vehicle.vehicle_owner,
                    record.vehicle.vehicle_name,
                    record.vehicle.registration_number,
                    record.vehicle.frame_number,
                    record.vehicle.model_spec,
                    record.vehicle.first_registration,
                    record.vehicle.inspection_expiry,
                    record.vehicle.usage_vehicle_type,
                    record.vehicle.is_electric_vehicle,
                    record.vehicle.is_hybrid,
                    record.vehicle.is_aeb,
                    record.vehicle.document_date,
                    record.vehicle.page_start,
                    record.vehicle.page_end,
                    record.bike_id,
                    record.bike_name,
                    record.match_status,
                    record.is_archived,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_record(
        &self,
        certificate_id: &str,
        record_id: &str,
    ) -> Result<Option<CertificateRecord>, StoreError> {
        let records = self.load_records(certificate_id)?;
        Ok(records.into_iter().find(|record| record.id == record_id))
    }

    fn update_record(
        &mut self,
        certificate_id: &str,
        record: &CertificateRecord,
        matched_count: usize,
        unmatched_count: usize,
    ) -> Result<(), StoreError> {
        let tx = self.connection.transaction()?;

        let changed = tx.execute(
            "UPDATE certificate_records
             SET bike_id = ?1, bike_name = ?2, match_status = ?3, is_archived = ?4
             WHERE certificate_id = ?5 AND record_id = ?6",
            params![
                record.bike_id,
                record.bike_name,
                record.match_status,
                record.is_archived,
                certificate_id,
                record.id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::RecordNotFound {
                certificate_id: certificate_id.to_string(),
                record_id: record.id.clone(),
            });
        }

        let changed = tx.execute(
            "UPDATE certificates SET matched_count = ?1, unmatched_count = ?2
             WHERE certificate_id = ?3",
            params![matched_count as i64, unmatched_count as i64, certificate_id],
        )?;
        if changed == 0 {
            return Err(StoreError::CertificateNotFound(certificate_id.to_string()));
        }

        tx.commit()?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Certificate>, StoreError> {
        let sql = format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates
             ORDER BY target_year, target_month"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let ids = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, rusqlite::Error>>()?;

        let mut certificates = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(certificate) = self.get(&id)? {
                certificates.push(certificate);
            }
        }
        Ok(certificates)
    }
}

impl ToSql for MatchStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for MatchStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::parse(text).ok_or(FromSqlError::InvalidType)
    }
}
