// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types that describe a conversion:
//
//   - what a convolution / normalization layer holds
//   - which layers get exported and under which name
//   - what a packaged model says about itself
//   - how a conversion can fail
//
// No burn types and no file I/O in here.

// Typed conv / batch norm parameters
pub mod layer;

// The (conv, norm, name) layer table
pub mod mapping;

// Metadata bundled into a packaged model
pub mod metadata;

// Conversion failures
pub mod error;

// Abstractions the data layer implements
pub mod traits;
