use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use super::{PredictiveModel, RawPredictions};
use crate::data::model::{CellValue, Dataset};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Persisted artifact
// ---------------------------------------------------------------------------

/// A fitted preprocessing + multi-output linear regression pipeline as
/// written by the training side.
///
/// ```json
/// {
///   "steps": [
///     { "kind": "numeric", "column": "TO 1", "mean": 540.2, "scale": 61.7 },
///     { "kind": "one_hot", "column": "RUMPUN", "categories": ["SAINTEK", "SOSHUM"] }
///   ],
///   "regressor": {
///     "coefficients": [[...], ...],
///     "intercepts": [...]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub steps: Vec<FeatureStep>,
    pub regressor: LinearRegressor,
}

/// One column's contribution to the encoded feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureStep {
    /// `(x - mean) / scale`; a zero scale leaves the centred value unscaled.
    Numeric {
        column: String,
        mean: f64,
        scale: f64,
    },
    /// One indicator per category; unseen categories encode as all zeros.
    OneHot {
        column: String,
        categories: Vec<String>,
    },
}

impl FeatureStep {
    pub fn column(&self) -> &str {
        match self {
            FeatureStep::Numeric { column, .. } | FeatureStep::OneHot { column, .. } => column,
        }
    }

    fn width(&self) -> usize {
        match self {
            FeatureStep::Numeric { .. } => 1,
            FeatureStep::OneHot { categories, .. } => categories.len(),
        }
    }
}

/// `y[k] = intercepts[k] + coefficients[k] · x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Loaded pipeline
// ---------------------------------------------------------------------------

/// A validated [`PipelineArtifact`] ready for inference.
#[derive(Debug, Clone)]
pub struct LinearPipeline {
    artifact: PipelineArtifact,
    encoded_width: usize,
}

impl LinearPipeline {
    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self> {
        if artifact.steps.is_empty() {
            return Err(DashboardError::ModelArtifact("pipeline has no steps".into()));
        }
        for step in &artifact.steps {
            if let FeatureStep::Numeric { column, mean, scale } = step {
                if !mean.is_finite() || !scale.is_finite() {
                    return Err(DashboardError::ModelArtifact(format!(
                        "non-finite scaling parameters for '{column}'"
                    )));
                }
            }
        }

        let encoded_width = artifact.steps.iter().map(FeatureStep::width).sum();
        let reg = &artifact.regressor;
        if reg.intercepts.is_empty() {
            return Err(DashboardError::ModelArtifact("regressor has no outputs".into()));
        }
        if reg.coefficients.len() != reg.intercepts.len() {
            return Err(DashboardError::ModelArtifact(format!(
                "{} coefficient rows for {} intercepts",
                reg.coefficients.len(),
                reg.intercepts.len()
            )));
        }
        if let Some((k, row)) = reg
            .coefficients
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != encoded_width)
        {
            return Err(DashboardError::ModelArtifact(format!(
                "output {k} has {} coefficients but the steps encode {encoded_width} features",
                row.len()
            )));
        }

        Ok(LinearPipeline {
            artifact,
            encoded_width,
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: PipelineArtifact = serde_json::from_slice(bytes)
            .map_err(|e| DashboardError::ModelArtifact(format!("decoding JSON: {e}")))?;
        Self::from_artifact(artifact)
    }

    /// Number of scores produced per row.
    pub fn outputs(&self) -> usize {
        self.artifact.regressor.intercepts.len()
    }

    pub fn encoded_width(&self) -> usize {
        self.encoded_width
    }

    fn encode_row(
        &self,
        features: &Dataset,
        positions: &[usize],
        row: usize,
    ) -> anyhow::Result<Vec<f64>> {
        let cells = &features.rows()[row];
        let mut encoded = Vec::with_capacity(self.encoded_width);
        for (step, &pos) in self.artifact.steps.iter().zip(positions) {
            let cell = &cells[pos];
            match step {
                FeatureStep::Numeric { column, mean, scale } => {
                    let Some(x) = cell.as_f64().filter(|x| x.is_finite()) else {
                        bail!("row {row}, column '{column}': could not convert {cell} to a number");
                    };
                    let scale = if *scale == 0.0 { 1.0 } else { *scale };
                    encoded.push((x - mean) / scale);
                }
                FeatureStep::OneHot { categories, .. } => {
                    let label = match cell {
                        CellValue::Null => None,
                        other => Some(other.to_string()),
                    };
                    encoded.extend(
                        categories
                            .iter()
                            .map(|c| if label.as_deref() == Some(c.as_str()) { 1.0 } else { 0.0 }),
                    );
                }
            }
        }
        Ok(encoded)
    }
}

impl PredictiveModel for LinearPipeline {
    fn predict(&self, features: &Dataset) -> anyhow::Result<RawPredictions> {
        let positions = self
            .artifact
            .steps
            .iter()
            .map(|step| {
                features
                    .column_index(step.column())
                    .with_context(|| format!("input has no column '{}'", step.column()))
            })
            .collect::<anyhow::Result<Vec<usize>>>()?;

        let reg = &self.artifact.regressor;
        let mut rows = Vec::with_capacity(features.len());
        for row in 0..features.len() {
            let x = self.encode_row(features, &positions, row)?;
            rows.push(
                reg.coefficients
                    .iter()
                    .zip(&reg.intercepts)
                    .map(|(coef, b)| b + coef.iter().zip(&x).map(|(w, xi)| w * xi).sum::<f64>())
                    .collect(),
            );
        }
        Ok(RawPredictions::new(self.outputs(), rows)?)
    }
}
