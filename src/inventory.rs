use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Vehicle;

/// Snapshot of the rentable fleet plus the archived fleet. This subsystem
/// only reads it; the fleets are owned by the inventory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub active: Vec<Vehicle>,
    pub archived: Vec<Vehicle>,
}

impl VehicleInventoryManifest {
    /// Resolves a vehicle id, active pool first. The bool is true when the
    /// vehicle came from the archived pool.
    pub fn find(&self, bike_id: &str) -> Option<(&Vehicle, bool)> {
        if let Some(vehicle) = self.active.iter().find(|vehicle| vehicle.id == bike_id) {
            return Some((vehicle, false));
        }
        self.archived
            .iter()
            .find(|vehicle| vehicle.id == bike_id)
            .map(|vehicle| (vehicle, true))
    }
}

pub fn load(path: &Path) -> Result<VehicleInventoryManifest> {
    let raw =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: VehicleInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(manifest)
}
