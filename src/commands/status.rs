use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::{CertificateRepository, SqliteRepository};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("certificates.sqlite"));

    if !db_path.exists() {
        warn!(path = %db_path.display(), "certificate database missing");
        return Ok(());
    }

    let repository = SqliteRepository::open(&db_path)?;
    let certificates = repository.list()?;

    info!(
        path = %db_path.display(),
        certificates = certificates.len(),
        "certificate database status"
    );

    for certificate in &certificates {
        info!(
            certificate_id = %certificate.id,
            period = format!("{:04}-{:02}", certificate.target_year, certificate.target_month),
            file = %certificate.file_name,
            uploaded_at = %certificate.uploaded_at,
            total = certificate.total_vehicles,
            matched = certificate.matched_count,
            unmatched = certificate.unmatched_count,
            "certificate"
        );
    }

    Ok(())
}
