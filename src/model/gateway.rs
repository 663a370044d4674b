use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use super::pipeline::LinearPipeline;
use super::{PredictiveModel, RawPredictions};
use crate::data::model::Dataset;
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// ModelGateway – lazy, load-once access to the persisted pipeline
// ---------------------------------------------------------------------------

/// Owns the single model instance for the lifetime of the process.
///
/// The artifact is deserialized on the first successful [`get_model`] call
/// and every later call hands out the same `Arc`. A failed load is not
/// cached, so fixing the file and retrying works without a restart.
///
/// [`get_model`]: ModelGateway::get_model
pub struct ModelGateway {
    path: PathBuf,
    model: OnceLock<Arc<dyn PredictiveModel>>,
}

impl ModelGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ModelGateway {
            path: path.into(),
            model: OnceLock::new(),
        }
    }

    /// A gateway whose model is already initialised; the path is only
    /// reported, never read.
    #[cfg(test)]
    pub fn preloaded(path: impl Into<PathBuf>, model: Arc<dyn PredictiveModel>) -> Self {
        let gateway = ModelGateway::new(path);
        let _ = gateway.model.set(model);
        gateway
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// The cached model, loading it on first use.
    pub fn get_model(&self) -> Result<Arc<dyn PredictiveModel>> {
        if let Some(model) = self.model.get() {
            log::debug!("Using cached model from {}", self.path.display());
            return Ok(Arc::clone(model));
        }

        let loaded: Arc<dyn PredictiveModel> = Arc::new(load_pipeline(&self.path)?);
        // Another caller may have won the race; keep whichever landed first.
        let model = self.model.get_or_init(|| loaded);
        Ok(Arc::clone(model))
    }
}

/// Deserialize the pipeline artifact at `path`.
pub fn load_pipeline(path: &Path) -> Result<LinearPipeline> {
    if !path.exists() {
        return Err(DashboardError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let pipeline = LinearPipeline::from_json(&bytes)?;
    log::info!(
        "Loaded model from {} ({} encoded features, {} outputs)",
        path.display(),
        pipeline.encoded_width(),
        pipeline.outputs()
    );
    Ok(pipeline)
}

/// Run `model` on `dataset`. Any failure inside the model, including a
/// panic, comes back as [`DashboardError::Inference`].
pub fn predict(model: &dyn PredictiveModel, dataset: &Dataset) -> Result<RawPredictions> {
    let outcome = catch_unwind(AssertUnwindSafe(|| model.predict(dataset)))
        .map_err(|_| DashboardError::Inference("model panicked during prediction".into()))?;
    let raw = outcome.map_err(|e| DashboardError::Inference(format!("{e:#}")))?;

    if raw.len() != dataset.len() {
        return Err(DashboardError::Inference(format!(
            "model returned {} rows for {} input rows",
            raw.len(),
            dataset.len()
        )));
    }
    log::info!("Predicted {} rows x {} outputs", raw.len(), raw.width());
    Ok(raw)
}
