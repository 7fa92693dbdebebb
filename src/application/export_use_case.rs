// ============================================================
// Layer 2 - ExportUseCase (raw parameter blobs)
// ============================================================
// Writes one <name>.bin file per layer table entry:
//
//   Step 1: Load the trained weights        (Layer 4 - data)
//   Step 2: Load the layer table            (Layer 4 - data)
//   Step 3: Create the output directory     (Layer 6 - infra)
//   Step 4: For each entry, in table order:
//             read conv (+ norm) tensors    (Layer 3 - domain)
//             reorder and pack              (Layer 4 - data)
//   Step 5: Write every <name>.bin          (Layer 6 - infra)
//
// Every entry is packed before the first file is written, so a
// bad entry anywhere in the table leaves the directory untouched.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::data::{loader::SafeTensorsModel, packer, table_loader::load_table};
use crate::domain::mapping::{LayerMapping, LayerTable};
use crate::domain::traits::WeightSource;
use crate::infra::blob_writer::BlobWriter;

// ─── Export Configuration ────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub model_path: PathBuf,
    pub out_dir:    PathBuf,
    /// JSON layer table; None uses the tiny-yolo-voc defaults
    pub table_path: Option<PathBuf>,
}

/// One written blob.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedLayer {
    pub name:   String,
    pub path:   PathBuf,
    pub values: usize,
}

pub struct ExportUseCase {
    config: ExportConfig,
}

impl ExportUseCase {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<ExportedLayer>> {
        let cfg = &self.config;

        // ── Step 1 + 2: weights and table ─────────────────────────────────────
        let model = SafeTensorsModel::open(&cfg.model_path)?;
        let table = load_table(cfg.table_path.as_deref())?;

        // ── Step 3: output directory ──────────────────────────────────────────
        let writer = BlobWriter::new(&cfg.out_dir)?;
        tracing::info!(
            "Converting parameters: {} layers -> '{}'",
            table.len(),
            writer.dir().display()
        );

        // ── Step 4: pack and write every layer ────────────────────────────────
        export_layers(&model, &table, &writer)
    }
}

/// Pack every table entry, then write them all in table order.
pub fn export_layers<S: WeightSource + ?Sized>(
    source: &S,
    table:  &LayerTable,
    writer: &BlobWriter,
) -> Result<Vec<ExportedLayer>> {
    let packed = table
        .iter()
        .map(|m| {
            pack_entry(source, m).with_context(|| format!("Cannot export layer '{}'", m.name))
        })
        .collect::<Result<Vec<_>>>()?;

    packed
        .into_iter()
        .map(|(m, blob)| {
            tracing::info!("{}", m.name);
            let path = writer.write(&m.name, &blob)?;
            Ok(ExportedLayer { name: m.name.clone(), path, values: blob.len() })
        })
        .collect()
}

fn pack_entry<'t, S: WeightSource + ?Sized>(
    source: &S,
    m:      &'t LayerMapping,
) -> Result<(&'t LayerMapping, Vec<f32>)> {
    let conv = source.conv(m.conv)?;
    let norm = m.norm.map(|index| source.norm(index)).transpose()?;
    Ok((m, packer::pack_layer(&conv, norm.as_ref())?))
}
