// ============================================================
// Layer 2 - InspectUseCase
// ============================================================
// Reads a package back: metadata, then the weight record loaded
// into a module rebuilt from the stored architecture. A package
// whose record does not fit its own architecture is rejected.

use anyhow::{bail, Result};
use burn::module::Module;
use std::path::PathBuf;

use crate::domain::metadata::PackageMetadata;
use crate::infra::package_store::load_package;
use crate::ml::{builder::restore_model, ConvertBackend};

pub struct PackageReport {
    pub metadata: PackageMetadata,
    /// Parameters actually present in the restored module
    pub params:   usize,
}

pub struct InspectUseCase {
    package_path: PathBuf,
}

impl InspectUseCase {
    pub fn new(package_path: impl Into<PathBuf>) -> Self {
        Self { package_path: package_path.into() }
    }

    pub fn execute(&self) -> Result<PackageReport> {
        let (metadata, record) = load_package(&self.package_path)?;

        let device = Default::default();
        let model = restore_model::<ConvertBackend>(&metadata.architecture, record, &device)?;
        let params = model.num_params();

        let expected = metadata.parameter_count();
        if params != expected {
            bail!(
                "Package '{}' holds {} parameters but its architecture describes {}",
                self.package_path.display(),
                params,
                expected,
            );
        }

        tracing::debug!("Restored {} blocks from '{}'", model.num_blocks(), self.package_path.display());
        Ok(PackageReport { metadata, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{tiny_table, InMemoryModel};
    use crate::domain::metadata::{BlockSpec, FeatureDescription};
    use crate::infra::package_store::save_package;
    use crate::ml::builder::{build_model, load_blocks, record_bytes};
    use tempfile::TempDir;

    fn metadata(architecture: Vec<BlockSpec>) -> PackageMetadata {
        PackageMetadata {
            author:            "a".into(),
            license:           "l".into(),
            short_description: "d".into(),
            input:  FeatureDescription { name: "image".into(), description: String::new() },
            output: FeatureDescription { name: "grid".into(),  description: String::new() },
            image_input:  true,
            image_scale:  1.0 / 255.0,
            architecture,
            source:       String::new(),
            converted_at: String::new(),
        }
    }

    #[test]
    fn test_inspect_restores_written_package() {
        let blocks = load_blocks(&InMemoryModel::tiny(), &tiny_table()).unwrap();
        let specs: Vec<BlockSpec> = blocks.iter().map(|b| b.spec.clone()).collect();
        let device = Default::default();
        let record = record_bytes(build_model::<ConvertBackend>(&blocks, &device)).unwrap();

        let tmp = TempDir::new().unwrap();
        let path = save_package(&tmp.path().join("tiny"), &metadata(specs), &record).unwrap();

        let report = InspectUseCase::new(path).execute().unwrap();
        // 108 + 16  +  72 + 8  +  6 + 3
        assert_eq!(report.params, 213);
        assert_eq!(report.metadata.architecture.len(), 3);
    }
}
