// ============================================================
// Layer 6 - Blob Writer
// ============================================================
// Writes packed layer parameters as raw little-endian f32
// files, one `<name>.bin` per exported layer, into a single
// output directory. Existing files are overwritten.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::data::packer::to_bytes;

pub struct BlobWriter {
    dir: PathBuf,
}

impl BlobWriter {
    /// Create a writer for `dir`, creating the directory (and its
    /// parents) if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path the blob for `name` is written to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.bin"))
    }

    /// Write `values` to `<dir>/<name>.bin`, returning the path.
    pub fn write(&self, name: &str, values: &[f32]) -> Result<PathBuf> {
        let path = self.path_for(name);

        let file = File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        let mut out = BufWriter::new(file);
        out.write_all(&to_bytes(values))
            .and_then(|_| out.flush())
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Wrote {} values to '{}'", values.len(), path.display());
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
