// ============================================================
// Layer 6 - Package Store
// ============================================================
// Bundles a packaged model into one gzip-compressed tar file.
//
// Archive contents:
//   metadata.json  - PackageMetadata (credits, I/O, architecture)
//   model.bin      - burn module record (BinBytesRecorder, f32)
//
// A path without a .gz extension gets ".tar.gz" appended, so
// `--output TinyYOLO` produces TinyYOLO.tar.gz.

use anyhow::{anyhow, Context, Result};
use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use tar::{Archive, Builder, Header};

use crate::domain::metadata::PackageMetadata;

const METADATA_ENTRY: &str = "metadata.json";
const MODEL_ENTRY: &str = "model.bin";

/// Final archive path for a requested output path.
pub fn package_path(output: &Path) -> PathBuf {
    if output.extension().and_then(|e| e.to_str()) == Some("gz") {
        output.to_path_buf()
    } else {
        let mut name = output.as_os_str().to_owned();
        name.push(".tar.gz");
        PathBuf::from(name)
    }
}

/// Write metadata and the model record into one archive.
/// Returns the path actually written.
pub fn save_package(output: &Path, metadata: &PackageMetadata, model: &[u8]) -> Result<PathBuf> {
    let path = package_path(output);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
    }

    let file = File::create(&path)
        .with_context(|| format!("Cannot create package '{}'", path.display()))?;
    let mut archive = Builder::new(GzEncoder::new(file, Compression::default()));

    let json = serde_json::to_string_pretty(metadata).context("Cannot serialize metadata")?;
    append_entry(&mut archive, METADATA_ENTRY, json.as_bytes())?;
    append_entry(&mut archive, MODEL_ENTRY, model)?;

    // finish() writes the tar trailer; into_inner().finish() the gzip one
    archive
        .into_inner()
        .context("Cannot finalize tar archive")?
        .finish()
        .with_context(|| format!("Cannot finalize package '{}'", path.display()))?;

    tracing::debug!(
        "Wrote package '{}' ({} byte record)",
        path.display(),
        model.len()
    );
    Ok(path)
}

/// Read only the metadata of a package.
pub fn load_metadata(path: &Path) -> Result<PackageMetadata> {
    let [json] = read_entries(path, [METADATA_ENTRY])?;
    parse_metadata(path, &json)
}

/// Read metadata and the raw model record in one pass over the archive.
pub fn load_package(path: &Path) -> Result<(PackageMetadata, Vec<u8>)> {
    let [json, model] = read_entries(path, [METADATA_ENTRY, MODEL_ENTRY])?;
    Ok((parse_metadata(path, &json)?, model))
}

fn parse_metadata(path: &Path, json: &[u8]) -> Result<PackageMetadata> {
    serde_json::from_slice(json)
        .with_context(|| format!("Invalid {METADATA_ENTRY} in '{}'", path.display()))
}

fn append_entry<W: std::io::Write>(archive: &mut Builder<W>, name: &str, data: &[u8]) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_path(name)?;
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    archive
        .append(&header, data)
        .with_context(|| format!("Cannot add {name} to package"))
}

/// Contents of the named entries, in the order asked for.
fn read_entries<const N: usize>(path: &Path, names: [&str; N]) -> Result<[Vec<u8>; N]> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open package '{}'", path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let mut found: [Option<Vec<u8>>; N] = std::array::from_fn(|_| None);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let slot = {
            let entry_path = entry.path()?;
            names.iter().position(|n| entry_path.to_str() == Some(*n))
        };
        let Some(slot) = slot else { continue };
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;
        found[slot] = Some(buf);
        if found.iter().all(Option::is_some) {
            break;
        }
    }

    let mut missing = names.iter().zip(&found).filter(|(_, f)| f.is_none()).map(|(n, _)| *n);
    if let Some(name) = missing.next() {
        return Err(anyhow!("{name} not found in package '{}'", path.display()));
    }
    Ok(found.map(Option::unwrap_or_default))
}
