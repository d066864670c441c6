use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bdg_schemas::InventorySnapshot;
use serde::de::DeserializeOwned;

pub const MOVEMENTS_FILE: &str = "movimientos.json";
pub const ARTICLES_FILE: &str = "articulos.json";
pub const PERSONNEL_FILE: &str = "personal.json";
pub const MOTIVES_FILE: &str = "motivos.json";

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid snapshot json: {}", path.display()))
}

/// Load a snapshot saved as the JSON arrays the backend serves.
/// `motivos.json` is optional.
pub fn load_snapshot_dir(dir: &Path) -> Result<InventorySnapshot> {
    let motives = dir.join(MOTIVES_FILE);
    Ok(InventorySnapshot {
        movimientos: read_json(&dir.join(MOVEMENTS_FILE))?,
        articulos: read_json(&dir.join(ARTICLES_FILE))?,
        personal: read_json(&dir.join(PERSONNEL_FILE))?,
        motivos: if motives.exists() {
            read_json(&motives)?
        } else {
            Vec::new()
        },
    })
}
