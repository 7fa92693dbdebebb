// ============================================================
// Layer 3 - Convolution and Normalization Parameters
// ============================================================
// Typed views over the raw parameter tensors of one layer.
//
// A source layer hands us a list of n-dimensional arrays in the
// order the training framework stored them:
//
//   convolution:   [kernel (kh, kw, in, out), bias (out)?]
//   normalization: [gamma, beta, moving mean, moving variance]
//
// These constructors check ranks and lengths once so that the
// packer and the model builder can assume well-formed inputs.

use ndarray::{Array1, Array4, ArrayD, Ix1, Ix4};

use crate::domain::error::ConvertError;

/// Convolution weights in source layout (kh, kw, in, out).
#[derive(Debug, Clone, PartialEq)]
pub struct ConvWeights {
    pub kernel: Array4<f32>,
    pub bias:   Option<Array1<f32>>,
}

impl ConvWeights {
    pub fn new(kernel: Array4<f32>) -> Self {
        Self { kernel, bias: None }
    }

    /// Build from the parameter list of source layer `index`.
    /// Slot 0 is the kernel, slot 1 (if any) the bias.
    pub fn from_params(index: usize, params: Vec<ArrayD<f32>>) -> Result<Self, ConvertError> {
        if params.len() > 2 {
            return Err(ConvertError::ExtraParams {
                index,
                expected: 2,
                found:    params.len(),
            });
        }
        let mut params = params.into_iter();

        let kernel = params.next().ok_or(ConvertError::MissingParams {
            index,
            expected: 1,
            found:    0,
        })?;
        let kernel = to_rank::<Ix4>(index, 0, 4, kernel)?;

        let bias = match params.next() {
            Some(b) => Some(to_rank::<Ix1>(index, 1, 1, b)?),
            None => None,
        };

        let mut conv = Self::new(kernel);
        conv.bias = bias;
        if let Some(bias) = &conv.bias {
            if bias.len() != conv.out_channels() {
                return Err(ConvertError::BiasMismatch {
                    index,
                    conv_out: conv.out_channels(),
                    bias_len: bias.len(),
                });
            }
        }
        Ok(conv)
    }

    pub fn kernel_height(&self) -> usize { self.kernel.shape()[0] }
    pub fn kernel_width(&self)  -> usize { self.kernel.shape()[1] }
    pub fn in_channels(&self)   -> usize { self.kernel.shape()[2] }
    pub fn out_channels(&self)  -> usize { self.kernel.shape()[3] }
}

/// The four per-channel vectors of a batch normalization layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NormParams {
    pub gamma:    Array1<f32>,
    pub beta:     Array1<f32>,
    pub mean:     Array1<f32>,
    pub variance: Array1<f32>,
}

impl NormParams {
    /// All four vectors must have the same length.
    pub fn new(
        gamma:    Array1<f32>,
        beta:     Array1<f32>,
        mean:     Array1<f32>,
        variance: Array1<f32>,
    ) -> Result<Self, ConvertError> {
        let expected = gamma.len();
        for (what, v) in [("beta", &beta), ("mean", &mean), ("variance", &variance)] {
            if v.len() != expected {
                return Err(ConvertError::NormLengthMismatch {
                    what,
                    expected,
                    found: v.len(),
                });
            }
        }
        Ok(Self { gamma, beta, mean, variance })
    }

    /// Build from the parameter list of source layer `index`.
    pub fn from_params(index: usize, params: Vec<ArrayD<f32>>) -> Result<Self, ConvertError> {
        if params.len() < 4 {
            return Err(ConvertError::MissingParams {
                index,
                expected: 4,
                found:    params.len(),
            });
        }
        if params.len() > 4 {
            return Err(ConvertError::ExtraParams {
                index,
                expected: 4,
                found:    params.len(),
            });
        }

        // Order fixed by the source framework: gamma, beta, mean, variance.
        let vectors = params
            .into_iter()
            .enumerate()
            .map(|(slot, p)| to_rank::<Ix1>(index, slot, 1, p))
            .collect::<Result<Vec<_>, _>>()?;
        let [gamma, beta, mean, variance]: [Array1<f32>; 4] =
            vectors.try_into().map_err(|v: Vec<Array1<f32>>| ConvertError::MissingParams {
                index,
                expected: 4,
                found:    v.len(),
            })?;

        Self::new(gamma, beta, mean, variance)
    }

    /// One value per output channel in every vector.
    pub fn channels(&self) -> usize {
        self.gamma.len()
    }
}

fn to_rank<D: ndarray::Dimension>(
    index:    usize,
    slot:     usize,
    expected: usize,
    array:    ArrayD<f32>,
) -> Result<ndarray::Array<f32, D>, ConvertError> {
    let shape = array.shape().to_vec();
    array
        .into_dimensionality::<D>()
        .map_err(|_| ConvertError::BadRank { index, slot, expected, found: shape })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, IxDyn};

    fn dyn_array(shape: &[usize]) -> ArrayD<f32> {
        let n = shape.iter().product::<usize>();
        ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_conv_from_params_reads_kernel_and_bias() {
        let conv = ConvWeights::from_params(31, vec![dyn_array(&[1, 1, 8, 5]), dyn_array(&[5])]).unwrap();
        assert_eq!(conv.out_channels(), 5);
        assert_eq!(conv.in_channels(), 8);
        assert_eq!(conv.bias.as_ref().map(|b| b.len()), Some(5));
    }

    #[test]
    fn test_conv_rejects_wrong_rank() {
        let err = ConvWeights::from_params(1, vec![dyn_array(&[3, 3, 4])]).unwrap_err();
        assert!(matches!(err, ConvertError::BadRank { index: 1, slot: 0, expected: 4, .. }));
    }

    #[test]
    fn test_conv_rejects_empty_layer() {
        let err = ConvWeights::from_params(3, Vec::new()).unwrap_err();
        assert!(matches!(err, ConvertError::MissingParams { index: 3, .. }));
    }

    #[test]
    fn test_norm_from_params_keeps_source_order() {
        let params = vec![
            ArrayD::from_elem(IxDyn(&[2]), 1.0),
            ArrayD::from_elem(IxDyn(&[2]), 2.0),
            ArrayD::from_elem(IxDyn(&[2]), 3.0),
            ArrayD::from_elem(IxDyn(&[2]), 4.0),
        ];
        let norm = NormParams::from_params(2, params).unwrap();
        assert_eq!(norm.gamma, arr1(&[1.0, 1.0]));
        assert_eq!(norm.beta, arr1(&[2.0, 2.0]));
        assert_eq!(norm.mean, arr1(&[3.0, 3.0]));
        assert_eq!(norm.variance, arr1(&[4.0, 4.0]));
    }

    #[test]
    fn test_norm_rejects_unequal_vectors() {
        let err = NormParams::new(
            arr1(&[1.0, 2.0]),
            arr1(&[1.0, 2.0]),
            arr1(&[1.0]),
            arr1(&[1.0, 2.0]),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::NormLengthMismatch { what: "mean", .. }));
    }

    #[test]
    fn test_norm_needs_four_vectors() {
        let err = NormParams::from_params(2, vec![dyn_array(&[4]); 3]).unwrap_err();
        assert!(matches!(err, ConvertError::MissingParams { expected: 4, found: 3, .. }));
    }

    #[test]
    fn test_surplus_tensors_are_rejected() {
        let err = ConvWeights::from_params(1, vec![dyn_array(&[1, 1, 2, 3]), dyn_array(&[3]), dyn_array(&[3])])
            .unwrap_err();
        assert!(matches!(err, ConvertError::ExtraParams { index: 1, expected: 2, found: 3 }));

        let err = NormParams::from_params(2, vec![dyn_array(&[4]); 5]).unwrap_err();
        assert!(matches!(err, ConvertError::ExtraParams { index: 2, expected: 4, found: 5 }));
    }
}
