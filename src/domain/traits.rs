// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The conversion pipelines only need positional access to the
// parameters of a trained model. Anything that can answer
// "what tensors does layer N hold?" can feed both pipelines,
// so the use cases are written against this trait and never
// against a particular file format.
//
// Implementations:
//   - SafeTensorsModel -> layers.<index>.<slot> keyed safetensors file
//   - InMemoryModel    -> hand-built layers (tests)

use ndarray::ArrayD;

use crate::domain::error::ConvertError;
use crate::domain::layer::{ConvWeights, NormParams};

// ─── WeightSource ─────────────────────────────────────────────────────────────
/// A trained model viewed as an ordered list of layers.
pub trait WeightSource {
    /// Number of layers, including those without parameters.
    fn layer_count(&self) -> usize;

    /// Human-readable name of the layer, if the source recorded one.
    fn layer_name(&self, index: usize) -> Option<&str>;

    /// Parameter tensors of layer `index`, in slot order.
    /// A layer without weights returns an empty Vec; an index
    /// past `layer_count()` is an error.
    fn layer_params(&self, index: usize) -> Result<Vec<ArrayD<f32>>, ConvertError>;

    /// Convolution weights stored at `index`.
    fn conv(&self, index: usize) -> Result<ConvWeights, ConvertError> {
        ConvWeights::from_params(index, self.layer_params(index)?)
    }

    /// Normalization vectors stored at `index`.
    fn norm(&self, index: usize) -> Result<NormParams, ConvertError> {
        NormParams::from_params(index, self.layer_params(index)?)
    }
}
