// ============================================================
// Layer 4 - Weight Loader
// ============================================================
// Loads a trained model's parameters from a safetensors file.
//
// Key convention inside the file:
//
//   layers.<layer-index>.<slot>   -> one parameter tensor
//
// where <slot> is the position of the tensor inside its layer
// (0 = conv kernel, 1 = conv bias; 0..3 = gamma, beta, mean,
// variance for batch norm). Layers without weights (input,
// activations, pooling) simply have no keys.
//
// Optional string metadata in the safetensors header:
//
//   layer_count          -> total number of layers
//   layers.<index>.name  -> layer name, e.g. "conv2d_1"
//
// The whole file is read once and every tensor is decoded to
// f32 up front; tiny-yolo is ~60 MB so this is not a concern.

use anyhow::{Context, Result};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};
use ndarray::{ArrayD, IxDyn};
use safetensors::{tensor::TensorView, Dtype, SafeTensors};

use crate::domain::error::ConvertError;
use crate::domain::traits::WeightSource;

/// Prefix shared by every parameter key.
const KEY_PREFIX: &str = "layers.";

/// Header metadata key holding the total layer count.
const LAYER_COUNT_KEY: &str = "layer_count";

/// A trained model loaded from a safetensors file.
/// Implements the WeightSource trait from Layer 3.
#[derive(Debug)]
pub struct SafeTensorsModel {
    layers: Vec<Vec<ArrayD<f32>>>,
    names:  Vec<Option<String>>,
}

impl SafeTensorsModel {
    /// Read and decode the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .with_context(|| format!("Cannot read model file '{}'", path.display()))?;

        let model = Self::from_bytes(&data)
            .with_context(|| format!("Cannot decode model file '{}'", path.display()))?;

        tracing::info!(
            "Loaded '{}': {} layers, {} with weights",
            path.display(),
            model.layer_count(),
            model.layers.iter().filter(|l| !l.is_empty()).count(),
        );
        Ok(model)
    }

    /// Decode an in-memory safetensors buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ConvertError> {
        let (_, header) = SafeTensors::read_metadata(data)?;
        let info: HashMap<String, String> = header.metadata().clone().unwrap_or_default();
        let tensors = SafeTensors::deserialize(data)?;

        // (layer, slot) -> tensor, sorted so each layer's slots come out in order
        let mut by_position: BTreeMap<(usize, usize), ArrayD<f32>> = BTreeMap::new();
        for (key, view) in tensors.tensors() {
            let position = parse_key(&key)?;
            by_position.insert(position, decode(&key, &view)?);
        }

        let present = by_position.keys().map(|(layer, _)| layer.saturating_add(1)).max().unwrap_or(0);
        let count = match info.get(LAYER_COUNT_KEY) {
            Some(raw) => {
                let declared = raw.parse::<usize>().map_err(|_| malformed_count(format!(
                    "'{raw}' is not a layer count"
                )))?;
                if declared < present {
                    return Err(malformed_count(format!(
                        "header declares {declared} layers but layer {} has weights",
                        present - 1
                    )));
                }
                declared
            }
            None => present,
        };

        let mut layers: Vec<Vec<ArrayD<f32>>> = with_len(count, Vec::new)?;
        for ((layer, slot), array) in by_position {
            let params = &mut layers[layer];
            // Slots must be dense: a gap would shift every later parameter
            if slot != params.len() {
                return Err(ConvertError::SlotGap { index: layer, slot: params.len() });
            }
            params.push(array);
        }

        let mut names: Vec<Option<String>> = with_len(count, || None)?;
        for (i, name) in names.iter_mut().enumerate() {
            *name = info.get(&format!("{KEY_PREFIX}{i}.name")).cloned();
        }

        Ok(Self { layers, names })
    }
}

impl WeightSource for SafeTensorsModel {
    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).and_then(|n| n.as_deref())
    }

    fn layer_params(&self, index: usize) -> Result<Vec<ArrayD<f32>>, ConvertError> {
        self.layers
            .get(index)
            .cloned()
            .ok_or(ConvertError::LayerOutOfRange { index, count: self.layers.len() })
    }
}

/// A vector of `len` fresh values; fails instead of aborting on
/// a length no allocation can hold.
fn with_len<T>(len: usize, fill: impl FnMut() -> T) -> Result<Vec<T>, ConvertError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|e| malformed_count(format!("{len} layers: {e}")))?;
    v.resize_with(len, fill);
    Ok(v)
}

fn malformed_count(reason: String) -> ConvertError {
    ConvertError::MalformedTensor { name: LAYER_COUNT_KEY.to_string(), reason }
}

/// "layers.5.0" -> (5, 0)
fn parse_key(key: &str) -> Result<(usize, usize), ConvertError> {
    let bad = || ConvertError::BadTensorKey(key.to_string());

    let rest = key.strip_prefix(KEY_PREFIX).ok_or_else(bad)?;
    let (layer, slot) = rest.split_once('.').ok_or_else(bad)?;
    let layer = layer.parse::<usize>().map_err(|_| bad())?;
    let slot  = slot.parse::<usize>().map_err(|_| bad())?;
    Ok((layer, slot))
}

/// Decode little-endian tensor bytes into an f32 array.
fn decode(name: &str, view: &TensorView<'_>) -> Result<ArrayD<f32>, ConvertError> {
    let bytes = view.data();
    let values: Vec<f32> = match view.dtype() {
        Dtype::F32 => bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        Dtype::F64 => bytes
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
        other => {
            return Err(ConvertError::UnsupportedDtype {
                name:  name.to_string(),
                dtype: format!("{other:?}"),
            })
        }
    };

    ArrayD::from_shape_vec(IxDyn(view.shape()), values).map_err(|e| {
        ConvertError::MalformedTensor { name: name.to_string(), reason: e.to_string() }
    })
}
