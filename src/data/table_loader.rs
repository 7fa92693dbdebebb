// ============================================================
// Layer 4 - Layer Table Loader
// ============================================================
// Reads the (conv, norm, name) layer table from a JSON file.
// With no file given, the built-in tiny-yolo-voc table is used.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::mapping::LayerTable;

/// Load and validate a layer table, or fall back to the default.
pub fn load_table(path: Option<&Path>) -> Result<LayerTable> {
    let Some(path) = path else {
        tracing::debug!("No layer table given, using the tiny-yolo-voc defaults");
        return Ok(LayerTable::default());
    };

    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read layer table '{}'", path.display()))?;

    let table: LayerTable = serde_json::from_str(&json)
        .with_context(|| format!("Layer table '{}' is not valid JSON", path.display()))?;

    table
        .validate()
        .with_context(|| format!("Layer table '{}' was rejected", path.display()))?;

    tracing::info!("Loaded {} layer mappings from '{}'", table.len(), path.display());
    Ok(table)
}
