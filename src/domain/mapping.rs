// ============================================================
// Layer 3 - Layer Table
// ============================================================
// Which source layers get exported, and under what name.
//
// The source model is a flat list of layers (input, conv,
// batch norm, leaky relu, max pool, ...). Only some of them
// carry weights we care about, and there is no general rule
// for discovering conv/norm pairs, so the pairing is supplied
// as configuration: one entry per exported blob.
//
// JSON form (see data::table_loader):
//   { "layers": [ { "conv": 1, "norm": 2, "name": "conv1" },
//                 { "conv": 31, "name": "conv9" } ] }

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConvertError;

/// One exported layer: a convolution, optionally folded with the
/// normalization layer that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMapping {
    /// Index of the convolution layer in the source model
    pub conv: usize,

    /// Index of the paired normalization layer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm: Option<usize>,

    /// Output name; the blob is written as `<name>.bin`
    pub name: String,
}

impl LayerMapping {
    pub fn new(conv: usize, norm: Option<usize>, name: impl Into<String>) -> Self {
        Self { conv, norm, name: name.into() }
    }
}

/// Ordered list of layer mappings. Export order follows this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTable {
    pub layers: Vec<LayerMapping>,
}

impl LayerTable {
    pub fn new(layers: Vec<LayerMapping>) -> Result<Self, ConvertError> {
        let table = Self { layers };
        table.validate()?;
        Ok(table)
    }

    /// The tiny-yolo-voc topology: eight conv + batch norm pairs
    /// separated by activation and pooling layers, then a final
    /// 1x1 conv with no normalization.
    pub fn tiny_yolo_voc() -> Self {
        let layers = vec![
            LayerMapping::new(1,  Some(2),  "conv1"),
            LayerMapping::new(5,  Some(6),  "conv2"),
            LayerMapping::new(9,  Some(10), "conv3"),
            LayerMapping::new(13, Some(14), "conv4"),
            LayerMapping::new(17, Some(18), "conv5"),
            LayerMapping::new(21, Some(22), "conv6"),
            LayerMapping::new(25, Some(26), "conv7"),
            LayerMapping::new(28, Some(29), "conv8"),
            LayerMapping::new(31, None,     "conv9"),
        ];
        Self { layers }
    }

    /// Names must be non-empty, unique, and usable as a file stem.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.is_empty() {
            return Err(ConvertError::InvalidTable("no layers listed".into()));
        }

        let mut seen = HashSet::new();
        for m in &self.layers {
            if m.name.trim().is_empty() {
                return Err(ConvertError::InvalidTable(format!(
                    "layer {} has an empty name",
                    m.conv
                )));
            }
            if m.name.contains(['/', '\\']) || m.name == "." || m.name == ".." {
                return Err(ConvertError::InvalidTable(format!(
                    "name '{}' is not a plain file name",
                    m.name
                )));
            }
            if !seen.insert(m.name.as_str()) {
                return Err(ConvertError::InvalidTable(format!(
                    "name '{}' appears more than once",
                    m.name
                )));
            }
            if m.norm == Some(m.conv) {
                return Err(ConvertError::InvalidTable(format!(
                    "'{}' pairs layer {} with itself",
                    m.name, m.conv
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerMapping> {
        self.layers.iter()
    }
}

impl Default for LayerTable {
    fn default() -> Self {
        Self::tiny_yolo_voc()
    }
}
