// ============================================================
// Layer 4 - Parameter Packer
// ============================================================
// Turns one convolution (plus its batch norm) into the flat
// parameter blob the GPU runtime reads at load time.
//
// Source kernel layout:  (kh, kw, in, out)
// Target kernel layout:  (out, kh, kw, in)
//
// i.e. every output channel's filter is contiguous. With a
// batch norm the blob is:
//
//   [ weights | mean | variance | gamma | beta ]
//     h*w*in*out   out    out       out    out
//
// and without one it is just the reordered weights. Values are
// 32-bit floats, no header, no length prefix, no padding; the
// consumer knows the layer shape a priori.
//
// The convolution bias never goes into the blob.

use ndarray::Array4;

use crate::domain::error::ConvertError;
use crate::domain::layer::{ConvWeights, NormParams};

/// Source axis feeding each target axis: (kh, kw, in, out) -> (out, kh, kw, in).
pub const KERNEL_PERMUTATION: [usize; 4] = [3, 0, 1, 2];

/// Reorder a (kh, kw, in, out) kernel to (out, kh, kw, in) and flatten it.
pub fn reorder_kernel(kernel: &Array4<f32>) -> Vec<f32> {
    // iter() walks the permuted view in logical row-major order
    kernel
        .view()
        .permuted_axes(KERNEL_PERMUTATION)
        .iter()
        .copied()
        .collect()
}

/// Number of f32 values `pack_layer` produces for this layer.
pub fn packed_len(conv: &ConvWeights, with_norm: bool) -> usize {
    let weights = conv.kernel.len();
    if with_norm {
        weights + 4 * conv.out_channels()
    } else {
        weights
    }
}

/// Build the flat parameter blob for one layer.
///
/// Fails if the normalization vectors are not exactly one value
/// per output channel; nothing is ever truncated or padded.
pub fn pack_layer(conv: &ConvWeights, norm: Option<&NormParams>) -> Result<Vec<f32>, ConvertError> {
    let Some(norm) = norm else {
        return Ok(reorder_kernel(&conv.kernel));
    };

    if norm.channels() != conv.out_channels() {
        return Err(ConvertError::ShapeMismatch {
            conv_out: conv.out_channels(),
            norm_len: norm.channels(),
        });
    }

    let mut blob = Vec::with_capacity(packed_len(conv, true));
    blob.extend(reorder_kernel(&conv.kernel));
    blob.extend(norm.mean.iter().copied());
    blob.extend(norm.variance.iter().copied());
    blob.extend(norm.gamma.iter().copied());
    blob.extend(norm.beta.iter().copied());
    Ok(blob)
}

/// Encode a blob as little-endian f32 bytes.
pub fn to_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array1};

    fn kernel(h: usize, w: usize, c_in: usize, c_out: usize) -> Array4<f32> {
        let n = h * w * c_in * c_out;
        Array4::from_shape_vec((h, w, c_in, c_out), (0..n).map(|v| v as f32).collect()).unwrap()
    }

    fn norm(gamma: &[f32], beta: &[f32], mean: &[f32], variance: &[f32]) -> NormParams {
        NormParams::new(arr1(gamma), arr1(beta), arr1(mean), arr1(variance)).unwrap()
    }

    #[test]
    fn test_reorder_small_kernel_by_hand() {
        // (1, 1, 2, 3): value at (in=i, out=o) is i*3 + o.
        // Output walks out-channels first, then in-channels.
        let k = kernel(1, 1, 2, 3);
        assert_eq!(reorder_kernel(&k), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_reorder_inverts_back_to_source() {
        let (h, w, c_in, c_out) = (3, 2, 5, 4);
        let source = kernel(h, w, c_in, c_out);
        let flat = reorder_kernel(&source);
        assert_eq!(flat.len(), h * w * c_in * c_out);

        // Read back as (out, h, w, in) and undo the permutation
        let restored = Array4::from_shape_vec((c_out, h, w, c_in), flat)
            .unwrap()
            .permuted_axes([1, 2, 3, 0]);
        assert_eq!(restored, source);
    }

    #[test]
    fn test_pack_without_norm_is_weights_only() {
        let conv = ConvWeights::new(kernel(3, 3, 2, 5));
        let blob = pack_layer(&conv, None).unwrap();
        assert_eq!(blob.len(), 3 * 3 * 2 * 5);
        assert_eq!(blob.len(), packed_len(&conv, false));
    }

    #[test]
    fn test_bias_is_not_packed() {
        let mut conv = ConvWeights::new(kernel(1, 1, 4, 3));
        conv.bias = Some(Array1::from_elem(3, -100.0));
        let blob = pack_layer(&conv, None).unwrap();
        assert_eq!(blob, reorder_kernel(&conv.kernel));
        assert!(!blob.contains(&-100.0));
    }

    #[test]
    fn test_norm_segments_follow_mean_variance_gamma_beta() {
        let conv = ConvWeights::new(kernel(3, 3, 2, 2));
        let bn = norm(&[10.0, 11.0], &[20.0, 21.0], &[30.0, 31.0], &[40.0, 41.0]);
        let blob = pack_layer(&conv, Some(&bn)).unwrap();

        let weights = 3 * 3 * 2 * 2;
        assert_eq!(blob.len(), weights + 4 * 2);
        assert_eq!(blob.len(), packed_len(&conv, true));
        assert_eq!(&blob[weights..weights + 2],      &[30.0, 31.0]); // mean
        assert_eq!(&blob[weights + 2..weights + 4],  &[40.0, 41.0]); // variance
        assert_eq!(&blob[weights + 4..weights + 6],  &[10.0, 11.0]); // gamma
        assert_eq!(&blob[weights + 6..weights + 8],  &[20.0, 21.0]); // beta
    }

    #[test]
    fn test_norm_sized_for_another_layer_is_rejected() {
        // conv with 16 output channels next to a norm sized for 32
        let conv = ConvWeights::new(kernel(3, 3, 1, 16));
        let v = vec![1.0; 32];
        let bn = norm(&v, &v, &v, &v);
        let err = pack_layer(&conv, Some(&bn)).unwrap_err();
        assert!(matches!(err, ConvertError::ShapeMismatch { conv_out: 16, norm_len: 32 }));
    }

    #[test]
    fn test_to_bytes_is_little_endian_without_header() {
        let bytes = to_bytes(&[1.0, -2.5]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..], &(-2.5f32).to_le_bytes());
    }
}
