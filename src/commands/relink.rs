use anyhow::Result;
use tracing::info;

use crate::cli::RelinkArgs;
use crate::inventory;
use crate::store::{self, CertificateRepository, SqliteRepository};

pub fn run(args: RelinkArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("certificates.sqlite"));
    let inventory_path = args
        .inventory_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("vehicle_inventory.json"));

    let fleet = inventory::load(&inventory_path)?;
    let mut repository = SqliteRepository::open(&db_path)?;

    let previous_status = repository
        .get_record(&args.certificate_id, &args.record_id)?
        .map(|record| record.match_status.as_str());

    let updated = store::relink_record(
        &mut repository,
        &fleet,
        &args.certificate_id,
        &args.record_id,
        &args.bike_id,
    )?;

    info!(
        certificate_id = %args.certificate_id,
        record_id = %updated.id,
        bike_id = %args.bike_id,
        bike_name = %updated.bike_name,
        previous_status = previous_status.unwrap_or("unknown"),
        status = updated.match_status.as_str(),
        archived = updated.is_archived,
        "record relinked"
    );

    Ok(())
}
