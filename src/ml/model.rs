use burn::{module::Param, prelude::*};

use crate::domain::metadata::BlockSpec;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TinyYoloConfig {
    /// Convolution blocks in forward order
    pub blocks: Vec<BlockSpec>,
}

impl TinyYoloConfig {
    /// Zero-initialised module with the configured shapes; the real
    /// weights come from a record or from `TinyYolo::from_blocks`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TinyYolo<B> {
        let blocks = self.blocks.iter().map(|spec| ConvBlock::zeros(spec, device)).collect();
        TinyYolo { blocks }
    }
}

/// Batch norm parameters kept exactly as trained (not folded).
#[derive(Module, Debug)]
pub struct BatchNormWeights<B: Backend> {
    pub gamma:    Param<Tensor<B, 1>>,
    pub beta:     Param<Tensor<B, 1>>,
    pub mean:     Param<Tensor<B, 1>>,
    pub variance: Param<Tensor<B, 1>>,
}

/// One convolution, kernel stored as [out, in, kh, kw].
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub kernel: Param<Tensor<B, 4>>,
    pub bias:   Option<Param<Tensor<B, 1>>>,
    pub norm:   Option<BatchNormWeights<B>>,
}

impl<B: Backend> ConvBlock<B> {
    fn zeros(spec: &BlockSpec, device: &B::Device) -> Self {
        let [kh, kw] = spec.kernel;
        let out = spec.out_channels;

        let vector = || Param::from_tensor(Tensor::<B, 1>::zeros([out], device));
        let kernel = Param::from_tensor(Tensor::<B, 4>::zeros([out, spec.in_channels, kh, kw], device));
        let bias = spec.bias.then(vector);
        let norm = spec.batch_norm.then(|| BatchNormWeights {
            gamma:    vector(),
            beta:     vector(),
            mean:     vector(),
            variance: vector(),
        });

        Self { kernel, bias, norm }
    }
}

#[derive(Module, Debug)]
pub struct TinyYolo<B: Backend> {
    pub blocks: Vec<ConvBlock<B>>,
}

impl<B: Backend> TinyYolo<B> {
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }
}
