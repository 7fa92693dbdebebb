// ============================================================
// Layer 2 - PackageUseCase (packaged model)
// ============================================================
// Produces one self-describing model archive:
//
//   Step 1: Load the trained weights         (Layer 4 - data)
//   Step 2: Load the layer table             (Layer 4 - data)
//   Step 3: Read and check every block       (Layer 5 - ml)
//   Step 4: Build the burn module, record it (Layer 5 - ml)
//   Step 5: Attach metadata                  (Layer 3 - domain)
//   Step 6: Write the tar.gz package         (Layer 6 - infra)

use anyhow::Result;
use std::path::PathBuf;

use crate::data::{loader::SafeTensorsModel, table_loader::load_table};
use crate::domain::metadata::{BlockSpec, FeatureDescription, PackageMetadata};
use crate::infra::package_store::save_package;
use crate::ml::{
    builder::{build_model, load_blocks, record_bytes},
    ConvertBackend,
};

// ─── Package Configuration ───────────────────────────────────────────────────
// Defaults describe the tiny-yolo-voc detector.
#[derive(Debug, Clone)]
pub struct PackageConfig {
    pub model_path: PathBuf,
    pub output:     PathBuf,
    pub table_path: Option<PathBuf>,

    pub author:             String,
    pub license:            String,
    pub description:        String,
    pub input_name:         String,
    pub input_description:  String,
    pub output_name:        String,
    pub output_description: String,
    pub image_scale:        f32,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model_data/tiny-yolo-voc.safetensors"),
            output:     PathBuf::from("TinyYOLO.tar.gz"),
            table_path: None,

            author:             "Original paper: Joseph Redmon, Ali Farhadi".to_string(),
            license:            "Public Domain".to_string(),
            description:        "The Tiny YOLO network from the paper 'YOLO9000: Better, \
                                 Faster, Stronger' (2016), arXiv:1612.08242"
                .to_string(),
            input_name:         "image".to_string(),
            input_description:  "Input image".to_string(),
            output_name:        "grid".to_string(),
            output_description: "The 13x13 grid with the bounding box data".to_string(),
            image_scale:        1.0 / 255.0,
        }
    }
}

impl PackageConfig {
    fn metadata(&self, architecture: Vec<BlockSpec>) -> PackageMetadata {
        let source = self
            .model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        PackageMetadata {
            author:            self.author.clone(),
            license:           self.license.clone(),
            short_description: self.description.clone(),
            input: FeatureDescription {
                name:        self.input_name.clone(),
                description: self.input_description.clone(),
            },
            output: FeatureDescription {
                name:        self.output_name.clone(),
                description: self.output_description.clone(),
            },
            image_input:  true,
            image_scale:  self.image_scale,
            architecture,
            source,
            converted_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

pub struct PackageUseCase {
    config: PackageConfig,
}

impl PackageUseCase {
    pub fn new(config: PackageConfig) -> Self {
        Self { config }
    }

    /// Returns the path of the written package.
    pub fn execute(&self) -> Result<PathBuf> {
        let cfg = &self.config;

        // ── Step 1 + 2: weights and table ─────────────────────────────────────
        let model = SafeTensorsModel::open(&cfg.model_path)?;
        let table = load_table(cfg.table_path.as_deref())?;

        // ── Step 3: read every block, check conv/norm pairing ─────────────────
        let blocks = load_blocks(&model, &table)?;
        let architecture: Vec<BlockSpec> = blocks.iter().map(|b| b.spec.clone()).collect();

        // ── Step 4: burn module -> record bytes ───────────────────────────────
        let device = Default::default();
        let yolo = build_model::<ConvertBackend>(&blocks, &device);
        let record = record_bytes(yolo)?;

        // ── Step 5: metadata ──────────────────────────────────────────────────
        let metadata = cfg.metadata(architecture);
        tracing::info!(
            "Packaging {} blocks, {} parameters",
            metadata.architecture.len(),
            metadata.parameter_count()
        );

        // ── Step 6: write the archive ─────────────────────────────────────────
        let path = save_package(&cfg.output, &metadata, &record)?;
        tracing::info!("Saved package '{}'", path.display());
        Ok(path)
    }
}
