// ============================================================
// Layer 3 - Conversion Errors
// ============================================================
// Every way a conversion can be rejected before a byte is
// written. The application layer wraps these in anyhow with
// the file or layer name attached; nothing here is retried.

use thiserror::Error;

/// Fatal precondition failures raised while reading or packing weights.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("layer {index} is out of range (model has {count} layers)")]
    LayerOutOfRange { index: usize, count: usize },

    #[error("layer {index}: expected at least {expected} parameter tensors, found {found}")]
    MissingParams {
        index:    usize,
        expected: usize,
        found:    usize,
    },

    #[error("layer {index}: expected at most {expected} parameter tensors, found {found}")]
    ExtraParams {
        index:    usize,
        expected: usize,
        found:    usize,
    },

    #[error("layer {index}: parameter slot {slot} is missing but later slots are present")]
    SlotGap { index: usize, slot: usize },

    #[error("layer {index}: parameter {slot} should be {expected}-dimensional, got shape {found:?}")]
    BadRank {
        index:    usize,
        slot:     usize,
        expected: usize,
        found:    Vec<usize>,
    },

    #[error("normalization vectors differ in length: {what} has {found}, gamma has {expected}")]
    NormLengthMismatch {
        what:     &'static str,
        expected: usize,
        found:    usize,
    },

    #[error("convolution has {conv_out} output channels but normalization has {norm_len}")]
    ShapeMismatch { conv_out: usize, norm_len: usize },

    #[error("layer {index}: bias has {bias_len} values for {conv_out} output channels")]
    BiasMismatch {
        index:    usize,
        conv_out: usize,
        bias_len: usize,
    },

    #[error("tensor '{name}' has unsupported element type {dtype}")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("tensor '{name}' is malformed: {reason}")]
    MalformedTensor { name: String, reason: String },

    #[error("tensor key '{0}' does not follow layers.<index>.<slot>")]
    BadTensorKey(String),

    #[error("layer table is invalid: {0}")]
    InvalidTable(String),

    #[error(transparent)]
    SafeTensors(#[from] safetensors::SafeTensorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message_names_both_sizes() {
        let err = ConvertError::ShapeMismatch { conv_out: 16, norm_len: 32 };
        let msg = err.to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("32"));
    }

    #[test]
    fn test_slot_gap_message_names_the_missing_slot() {
        let msg = ConvertError::SlotGap { index: 2, slot: 1 }.to_string();
        assert!(msg.contains("layer 2"));
        assert!(msg.contains("slot 1"));
    }
}
