// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// One use case per subcommand. Each one wires the other layers
// together in a fixed order and returns what it produced; the
// CLI layer does the printing.

// Raw per-layer parameter blobs
pub mod export_use_case;

// Packaged model archive
pub mod package_use_case;

// Per-layer model summary
pub mod summary_use_case;

// Read a package back
pub mod inspect_use_case;
