// ============================================================
// Layer 5 - Model Builder
// ============================================================
// Moves trained weights into a burn TinyYolo module and turns
// the module into record bytes (and back).
//
// Kernel layout change on the way in:
//   source (kh, kw, in, out)  ->  burn Conv2d layout (out, in, kh, kw)
//
// The architecture is not hard-coded: each table entry becomes
// one block, with its kernel size and channel counts read off
// the stored tensors.

use anyhow::{anyhow, Context, Result};
use burn::{
    module::Param,
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
};
use ndarray::{Array1, Array4};

use crate::domain::error::ConvertError;
use crate::domain::layer::{ConvWeights, NormParams};
use crate::domain::mapping::{LayerMapping, LayerTable};
use crate::domain::metadata::BlockSpec;
use crate::domain::traits::WeightSource;
use crate::ml::model::{BatchNormWeights, ConvBlock, TinyYolo, TinyYoloConfig};

/// Source axis feeding each burn kernel axis.
const BURN_KERNEL_PERMUTATION: [usize; 4] = [3, 2, 0, 1];

/// Weights of one table entry, read and checked.
#[derive(Debug, Clone)]
pub struct LoadedBlock {
    pub spec: BlockSpec,
    pub conv: ConvWeights,
    pub norm: Option<NormParams>,
}

/// Read every table entry from `source`, checking that each
/// normalization layer matches its convolution.
pub fn load_blocks<S: WeightSource + ?Sized>(
    source: &S,
    table:  &LayerTable,
) -> Result<Vec<LoadedBlock>> {
    let blocks = table
        .iter()
        .map(|m| load_block(source, m).with_context(|| format!("Cannot read layer '{}'", m.name)))
        .collect::<Result<Vec<_>>>()?;

    // A sequential detector feeds each block into the next
    for pair in blocks.windows(2) {
        let (prev, next) = (&pair[0].spec, &pair[1].spec);
        if prev.out_channels != next.in_channels {
            tracing::warn!(
                "'{}' outputs {} channels but '{}' expects {}",
                prev.name, prev.out_channels, next.name, next.in_channels,
            );
        }
    }
    Ok(blocks)
}

fn load_block<S: WeightSource + ?Sized>(source: &S, m: &LayerMapping) -> Result<LoadedBlock, ConvertError> {
    let conv = source.conv(m.conv)?;
    let norm = match m.norm {
        Some(index) => {
            let norm = source.norm(index)?;
            if norm.channels() != conv.out_channels() {
                return Err(ConvertError::ShapeMismatch {
                    conv_out: conv.out_channels(),
                    norm_len: norm.channels(),
                });
            }
            Some(norm)
        }
        None => None,
    };

    let spec = BlockSpec {
        name:         m.name.clone(),
        kernel:       [conv.kernel_height(), conv.kernel_width()],
        in_channels:  conv.in_channels(),
        out_channels: conv.out_channels(),
        bias:         conv.bias.is_some(),
        batch_norm:   norm.is_some(),
    };
    Ok(LoadedBlock { spec, conv, norm })
}

/// Build a TinyYolo module holding the given weights.
pub fn build_model<B: Backend>(blocks: &[LoadedBlock], device: &B::Device) -> TinyYolo<B> {
    let blocks = blocks
        .iter()
        .map(|b| ConvBlock {
            kernel: Param::from_tensor(kernel_tensor(&b.conv.kernel, device)),
            bias:   b.conv.bias.as_ref().map(|v| Param::from_tensor(vector_tensor(v, device))),
            norm:   b.norm.as_ref().map(|n| BatchNormWeights {
                gamma:    Param::from_tensor(vector_tensor(&n.gamma, device)),
                beta:     Param::from_tensor(vector_tensor(&n.beta, device)),
                mean:     Param::from_tensor(vector_tensor(&n.mean, device)),
                variance: Param::from_tensor(vector_tensor(&n.variance, device)),
            }),
        })
        .collect();

    TinyYolo { blocks }
}

/// Serialize a module to full-precision record bytes.
pub fn record_bytes<B: Backend>(model: TinyYolo<B>) -> Result<Vec<u8>> {
    let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
    Recorder::<B>::record(&recorder, model.into_record(), ())
        .map_err(|e| anyhow!("Cannot serialize model record: {e:?}"))
}

/// Rebuild a module from its architecture and record bytes.
pub fn restore_model<B: Backend>(
    architecture: &[BlockSpec],
    bytes:        Vec<u8>,
    device:       &B::Device,
) -> Result<TinyYolo<B>> {
    let model: TinyYolo<B> = TinyYoloConfig::new(architecture.to_vec()).init(device);
    let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
    let record = Recorder::<B>::load(&recorder, bytes, device)
        .map_err(|e| anyhow!("Cannot load model record: {e:?}"))?;
    Ok(model.load_record(record))
}

fn kernel_tensor<B: Backend>(kernel: &Array4<f32>, device: &B::Device) -> Tensor<B, 4> {
    let view = kernel.view().permuted_axes(BURN_KERNEL_PERMUTATION);
    let shape: [usize; 4] = [view.shape()[0], view.shape()[1], view.shape()[2], view.shape()[3]];
    let values: Vec<f32> = view.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

fn vector_tensor<B: Backend>(values: &Array1<f32>, device: &B::Device) -> Tensor<B, 1> {
    Tensor::from_data(TensorData::new(values.to_vec(), [values.len()]), device)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{sequential, tiny_table, InMemoryModel};
    use crate::ml::ConvertBackend;

    fn values<const D: usize>(param: &Param<Tensor<ConvertBackend, D>>) -> Vec<f32> {
        param.val().into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_blocks_follow_table_and_tensor_shapes() {
        let blocks = load_blocks(&InMemoryModel::tiny(), &tiny_table()).unwrap();
        let specs: Vec<_> = blocks.iter().map(|b| &b.spec).collect();

        assert_eq!(specs.len(), 3);
        assert_eq!((specs[0].kernel, specs[0].in_channels, specs[0].out_channels), ([3, 3], 3, 4));
        assert!(specs[0].batch_norm && !specs[0].bias);
        assert_eq!((specs[2].kernel, specs[2].in_channels, specs[2].out_channels), ([1, 1], 2, 3));
        assert!(specs[2].bias && !specs[2].batch_norm);
    }

    #[test]
    fn test_mismatched_norm_is_rejected() {
        // conv at 3 has 2 output channels, norm at 2 has 4 values
        let table = LayerTable::new(vec![LayerMapping::new(3, Some(2), "bad")]).unwrap();
        let err = load_blocks(&InMemoryModel::tiny(), &table).unwrap_err();
        assert!(format!("{err:#}").contains("output channels"));
    }

    #[test]
    fn test_kernel_moves_to_burn_layout() {
        // (1, 1, 2, 3) -> [3, 2, 1, 1]; value at (in=i, out=o) is i*3 + o
        let model = InMemoryModel::with_layers(1).set(0, vec![sequential(&[1, 1, 2, 3])]);
        let table = LayerTable::new(vec![LayerMapping::new(0, None, "head")]).unwrap();
        let blocks = load_blocks(&model, &table).unwrap();

        let device = Default::default();
        let yolo = build_model::<ConvertBackend>(&blocks, &device);

        assert_eq!(yolo.blocks[0].kernel.val().dims(), [3, 2, 1, 1]);
        assert_eq!(values(&yolo.blocks[0].kernel), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_record_round_trip_keeps_weights() {
        let blocks = load_blocks(&InMemoryModel::tiny(), &tiny_table()).unwrap();
        let device = Default::default();
        let original = build_model::<ConvertBackend>(&blocks, &device);
        let expected_kernel = values(&original.blocks[1].kernel);

        let bytes = record_bytes(original).unwrap();
        let specs: Vec<BlockSpec> = blocks.iter().map(|b| b.spec.clone()).collect();
        let restored = restore_model::<ConvertBackend>(&specs, bytes, &device).unwrap();

        assert_eq!(restored.num_blocks(), 3);
        assert_eq!(values(&restored.blocks[1].kernel), expected_kernel);

        let norm = restored.blocks[1].norm.as_ref().unwrap();
        assert_eq!(values(&norm.mean), vec![5.0, 6.0]);
        assert_eq!(values(&norm.variance), vec![7.0, 8.0]);

        let bias = restored.blocks[2].bias.as_ref().unwrap();
        assert_eq!(values(bias), vec![0.5, 0.6, 0.7]);
    }
}
