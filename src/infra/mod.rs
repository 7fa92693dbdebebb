// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// File output for both pipelines:
//
//   blob_writer.rs    - raw <name>.bin parameter files
//                       One file per exported layer, plain
//                       little-endian f32, no header.
//
//   package_store.rs  - the packaged model archive
//                       tar.gz holding metadata.json and the
//                       burn record; also reads packages back.

/// Raw per-layer parameter files
pub mod blob_writer;

/// Packaged model archive (tar.gz)
pub mod package_store;
