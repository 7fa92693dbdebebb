// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between the weights file on disk and the flat
// parameter blobs:
//
//   model.safetensors
//       │
//       ▼
//   SafeTensorsModel  → decodes layers.<index>.<slot> tensors to f32
//       │
//       ▼
//   LayerTable        → says which layers pair up and their names
//       │
//       ▼
//   pack_layer        → reorders the kernel, appends batch norm vectors
//       │
//       ▼
//   to_bytes          → little-endian f32 bytes for infra::blob_writer
//
// Each module handles exactly one step.

/// Loads trained weights from a safetensors file
pub mod loader;

/// Reads the conv/norm layer table from JSON
pub mod table_loader;

/// Kernel axis reordering and blob packing
pub mod packer;

#[cfg(test)]
pub mod fixtures;
