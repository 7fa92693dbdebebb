// ============================================================
// Test fixtures
// ============================================================
// Small hand-built models for unit tests in every layer.

use std::collections::HashMap;

use ndarray::{ArrayD, IxDyn};
use safetensors::{tensor::TensorView, Dtype};

use crate::domain::error::ConvertError;
use crate::domain::traits::WeightSource;

/// One tensor to be written into a safetensors buffer.
pub struct FixtureTensor {
    pub key:   String,
    pub dtype: Dtype,
    pub shape: Vec<usize>,
    pub bytes: Vec<u8>,
}

impl FixtureTensor {
    pub fn f32(key: &str, shape: &[usize], values: Vec<f32>) -> Self {
        Self {
            key:   key.to_string(),
            dtype: Dtype::F32,
            shape: shape.to_vec(),
            bytes: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    pub fn f64(key: &str, shape: &[usize], values: Vec<f64>) -> Self {
        Self {
            key:   key.to_string(),
            dtype: Dtype::F64,
            shape: shape.to_vec(),
            bytes: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }
}

/// Serialize tensors plus header metadata into a safetensors buffer.
pub fn safetensors_bytes(tensors: &[FixtureTensor], metadata: &[(&str, &str)]) -> Vec<u8> {
    let views: Vec<(String, TensorView<'_>)> = tensors
        .iter()
        .map(|t| {
            let view = TensorView::new(t.dtype, t.shape.clone(), &t.bytes).unwrap();
            (t.key.clone(), view)
        })
        .collect();

    let info: Option<HashMap<String, String>> = if metadata.is_empty() {
        None
    } else {
        Some(metadata.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    };

    safetensors::serialize(views, &info).unwrap()
}

/// Values 0, 1, 2, ... laid out in `shape` (row-major).
pub fn sequential(shape: &[usize]) -> ArrayD<f32> {
    let n = shape.iter().product::<usize>();
    ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(|v| v as f32).collect()).unwrap()
}

/// A 1-D vector with the given values.
pub fn vector(values: &[f32]) -> ArrayD<f32> {
    ArrayD::from_shape_vec(IxDyn(&[values.len()]), values.to_vec()).unwrap()
}

/// WeightSource backed by a plain Vec of layers.
#[derive(Default)]
pub struct InMemoryModel {
    pub layers: Vec<Vec<ArrayD<f32>>>,
}

impl InMemoryModel {
    pub fn with_layers(count: usize) -> Self {
        Self { layers: vec![Vec::new(); count] }
    }

    pub fn set(mut self, index: usize, params: Vec<ArrayD<f32>>) -> Self {
        self.layers[index] = params;
        self
    }

    /// Two conv + batch norm pairs followed by a biased 1x1 conv,
    /// laid out the way the tiny table below expects.
    pub fn tiny() -> Self {
        Self::with_layers(6)
            .set(1, vec![sequential(&[3, 3, 3, 4])])
            .set(2, vec![
                vector(&[1.0, 1.1, 1.2, 1.3]),
                vector(&[0.0, 0.1, 0.2, 0.3]),
                vector(&[5.0, 5.1, 5.2, 5.3]),
                vector(&[9.0, 9.1, 9.2, 9.3]),
            ])
            .set(3, vec![sequential(&[3, 3, 4, 2])])
            .set(4, vec![
                vector(&[1.0, 2.0]),
                vector(&[3.0, 4.0]),
                vector(&[5.0, 6.0]),
                vector(&[7.0, 8.0]),
            ])
            .set(5, vec![sequential(&[1, 1, 2, 3]), vector(&[0.5, 0.6, 0.7])])
    }
}

impl WeightSource for InMemoryModel {
    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer_name(&self, _index: usize) -> Option<&str> {
        None
    }

    fn layer_params(&self, index: usize) -> Result<Vec<ArrayD<f32>>, ConvertError> {
        self.layers
            .get(index)
            .cloned()
            .ok_or(ConvertError::LayerOutOfRange { index, count: self.layers.len() })
    }
}

/// Layer table matching `InMemoryModel::tiny()`.
pub fn tiny_table() -> crate::domain::mapping::LayerTable {
    use crate::domain::mapping::{LayerMapping, LayerTable};

    LayerTable::new(vec![
        LayerMapping::new(1, Some(2), "conv1"),
        LayerMapping::new(3, Some(4), "conv2"),
        LayerMapping::new(5, None, "conv3"),
    ])
    .unwrap()
}
