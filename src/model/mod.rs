/// Model layer: the opaque predictor boundary and its process-wide cache.
///
/// ```text
///   model_pipeline.json ──load once──▶ ModelGateway ──Arc──▶ predict(Dataset)
///                                                             │
///                                                             ▼
///                                                       RawPredictions
/// ```

pub mod gateway;
pub mod pipeline;

use crate::data::model::Dataset;
use crate::error::{DashboardError, Result};

/// Anything that maps a validated feature table to one row of scores per
/// input row. Implementations are read-only after construction.
pub trait PredictiveModel: Send + Sync {
    fn predict(&self, features: &Dataset) -> anyhow::Result<RawPredictions>;
}

/// Unlabelled model output: `rows.len()` rows of exactly `width` scores.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPredictions {
    width: usize,
    rows: Vec<Vec<f64>>,
}

impl RawPredictions {
    pub fn new(width: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(DashboardError::Inference(format!(
                "prediction row {i} has {} values, expected {width}",
                row.len()
            )));
        }
        Ok(RawPredictions { width, rows })
    }

    /// Number of output columns.
    pub fn width(&self) -> usize {
        self.width
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
