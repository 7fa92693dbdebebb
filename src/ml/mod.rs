// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All burn-specific code lives here. The packaged model is a
// burn module record, so this is the only layer that needs to
// know how burn lays out convolution weights.
//
//   model.rs    - TinyYolo module: one block per exported
//                 convolution, kernel in burn's [out, in, kh, kw]
//                 layout, optional bias, optional batch norm
//
//   builder.rs  - Fills a TinyYolo from a WeightSource and a
//                 LayerTable; record bytes in and out

/// TinyYolo module and its config
pub mod model;

/// Weights -> module -> record bytes, and back
pub mod builder;

/// CPU backend used for conversion; no GPU is needed to move weights.
pub type ConvertBackend = burn::backend::NdArray;
