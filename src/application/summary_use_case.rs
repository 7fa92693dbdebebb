// ============================================================
// Layer 2 - SummaryUseCase
// ============================================================
// Lists every layer of a trained model with its parameter
// shapes, so a layer table can be written (or checked) against
// the real topology before converting.

use anyhow::Result;
use std::path::PathBuf;

use crate::data::loader::SafeTensorsModel;
use crate::domain::traits::WeightSource;

/// One row of the model summary.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    pub index:  usize,
    pub name:   Option<String>,
    pub shapes: Vec<Vec<usize>>,
    pub params: usize,
}

pub struct SummaryUseCase {
    model_path: PathBuf,
}

impl SummaryUseCase {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self { model_path: model_path.into() }
    }

    pub fn execute(&self) -> Result<Vec<LayerSummary>> {
        let model = SafeTensorsModel::open(&self.model_path)?;
        summarize(&model)
    }
}

/// Summarize every layer of `source`, including weightless ones.
pub fn summarize<S: WeightSource + ?Sized>(source: &S) -> Result<Vec<LayerSummary>> {
    (0..source.layer_count())
        .map(|index| {
            let params = source.layer_params(index)?;
            let shapes: Vec<Vec<usize>> = params.iter().map(|p| p.shape().to_vec()).collect();
            Ok(LayerSummary {
                index,
                name:   source.layer_name(index).map(str::to_string),
                params: params.iter().map(|p| p.len()).sum(),
                shapes,
            })
        })
        .collect()
}
