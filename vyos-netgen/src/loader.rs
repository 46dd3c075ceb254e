use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::model::Inventory;

/// Errors returned when loading inventory files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read inventory {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse inventory {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Load an inventory from a YAML (or JSON) file.
pub fn load_inventory(path: &Path) -> Result<Inventory, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let inventory = parse_inventory(&raw, path.display().to_string())?;
    debug!(
        path = %path.display(),
        networks = inventory.networks.len(),
        port_groups = inventory.port_groups.len(),
        "loaded inventory"
    );
    Ok(inventory)
}

fn parse_inventory(raw: &str, path: String) -> Result<Inventory, LoadError> {
    serde_yaml::from_str(raw).map_err(|source| LoadError::Parse { path, source })
}
