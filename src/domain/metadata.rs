// ============================================================
// Layer 3 - Package Metadata
// ============================================================
// Everything a packaged model carries besides its weights:
// free-text credits, the input/output contract, and enough of
// the architecture to rebuild an empty module before loading
// the weight record back into it.
//
// Stored as metadata.json inside the package archive.

use serde::{Deserialize, Serialize};

/// Shape and wiring of one packaged convolution block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub name:         String,
    pub kernel:       [usize; 2],
    pub in_channels:  usize,
    pub out_channels: usize,
    pub bias:         bool,
    pub batch_norm:   bool,
}

/// Describes one named input or output of the packaged model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescription {
    pub name:        String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub author:            String,
    pub license:           String,
    pub short_description: String,

    pub input:  FeatureDescription,
    pub output: FeatureDescription,

    /// The input is an image; pixel values are multiplied by
    /// `image_scale` before entering the first convolution
    pub image_input: bool,
    pub image_scale: f32,

    /// Blocks in forward order
    pub architecture: Vec<BlockSpec>,

    /// File name of the weights the package was built from
    #[serde(default)]
    pub source: String,

    /// RFC 3339 timestamp of the conversion
    #[serde(default)]
    pub converted_at: String,
}

impl PackageMetadata {
    /// Total number of scalar parameters described by the architecture.
    pub fn parameter_count(&self) -> usize {
        self.architecture
            .iter()
            .map(|b| {
                let kernel = b.kernel[0] * b.kernel[1] * b.in_channels * b.out_channels;
                let bias   = if b.bias { b.out_channels } else { 0 };
                let norm   = if b.batch_norm { 4 * b.out_channels } else { 0 };
                kernel + bias + norm
            })
            .sum()
    }
}
