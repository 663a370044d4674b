use std::path::PathBuf;

use crate::config::AppConfig;
use crate::data::model::Dataset;
use crate::data::schema::FeatureSchema;
use crate::data::source::{DataSource, LocalFile, RemoteUrl, Upload};
use crate::error::{DashboardError, Result};
use crate::model::gateway::{predict, ModelGateway};
use crate::present::{self, ColumnMean, PredictionTable};

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// The four pages of the dashboard. Exactly one is active per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    UploadAndPredict,
    Visualize,
    About,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::Home,
        Page::UploadAndPredict,
        Page::Visualize,
        Page::About,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::UploadAndPredict => "Upload & Predict",
            Page::Visualize => "Visualize",
            Page::About => "About",
        }
    }
}

/// Where the Upload & Predict page takes its dataset from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    #[default]
    Remote,
    Local,
    Upload,
}

impl Origin {
    pub const ALL: [Origin; 3] = [Origin::Remote, Origin::Local, Origin::Upload];

    pub fn label(self) -> &'static str {
        match self {
            Origin::Remote => "Remote URL",
            Origin::Local => "Local file",
            Origin::Upload => "Upload",
        }
    }
}

/// Message shown under the page heading.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Success(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// Page results
// ---------------------------------------------------------------------------

/// Everything the Upload & Predict page shows after a successful run.
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub table: PredictionTable,
    pub means: Vec<ColumnMean>,
    /// `serialize(table)`, ready for the download button.
    pub csv: Vec<u8>,
}

/// The Visualize page's data.
#[derive(Debug, Clone)]
pub struct VisualData {
    pub preview: Dataset,
    pub total_rows: usize,
    pub column: String,
    /// Empty when the chart column could not be plotted.
    pub series: Vec<f64>,
}

/// validate → model → predict → present, for one dataset.
pub fn predict_dataset(dataset: &Dataset, gateway: &ModelGateway) -> Result<PredictionOutcome> {
    let features = FeatureSchema::utbk().validate(dataset)?;
    let model = gateway.get_model()?;
    let raw = predict(model.as_ref(), &features)?;
    let table = present::present(raw)?;
    let means = present::summarize(&table);
    let csv = present::serialize(&table)?;
    Ok(PredictionOutcome { table, means, csv })
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Only the current page's data lives here; navigating away discards it.
/// The model cache lives in [`ModelGateway`], outside this struct.
#[derive(Debug, Default)]
pub struct AppState {
    pub page: Page,

    /// Selected dataset origin and its inputs.
    pub origin: Origin,
    pub remote_url: String,
    pub local_path: String,
    pub upload: Option<Upload>,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Dataset>,

    pub predictions: Option<PredictionOutcome>,

    pub visual: Option<VisualData>,

    /// Status / error message shown in the UI.
    pub status: Option<Status>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            remote_url: config.data_url.clone(),
            ..Self::default()
        }
    }

    /// Switch page, dropping whatever the previous page had loaded.
    pub fn navigate(&mut self, page: Page, config: &AppConfig) {
        if page == self.page {
            return;
        }
        log::debug!("Navigating {:?} -> {:?}", self.page, page);
        self.page = page;
        self.dataset = None;
        self.predictions = None;
        self.visual = None;
        self.upload = None;
        self.status = None;
        match page {
            Page::Visualize => self.load_visualization(config),
            Page::UploadAndPredict if self.origin == Origin::Remote && config.autoload_remote => {
                self.load_selected(config)
            }
            _ => {}
        }
    }

    /// The data source for the current origin selection.
    pub fn selected_source(&self, config: &AppConfig) -> Result<Box<dyn DataSource>> {
        match self.origin {
            Origin::Remote => Ok(Box::new(RemoteUrl::detect(
                self.remote_url.trim(),
                &config.sheet_name,
                config.http_timeout(),
            )?)),
            Origin::Local => Ok(Box::new(LocalFile::detect(
                PathBuf::from(self.local_path.trim()),
                &config.sheet_name,
            )?)),
            Origin::Upload => match &self.upload {
                Some(upload) => Ok(Box::new(upload.clone())),
                None => Err(DashboardError::Parse("no file has been uploaded".into())),
            },
        }
    }

    /// Load from the selected origin.
    pub fn load_selected(&mut self, config: &AppConfig) {
        match self.selected_source(config) {
            Ok(source) => self.load_dataset(source.as_ref()),
            Err(e) => self.fail(e),
        }
    }

    /// Replace the dataset with whatever `source` yields. On failure the page
    /// is left without a dataset.
    pub fn load_dataset(&mut self, source: &dyn DataSource) {
        self.dataset = None;
        self.predictions = None;
        match source.load() {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows with columns {:?} from {}",
                    dataset.len(),
                    dataset.columns(),
                    source.describe()
                );
                self.status = Some(Status::Success(format!(
                    "Dataset loaded. Rows: {}",
                    dataset.len()
                )));
                self.dataset = Some(dataset);
            }
            Err(e) => self.fail(e),
        }
    }

    /// Take a user-supplied file as the upload origin and load it.
    pub fn accept_upload(&mut self, name: String, bytes: Vec<u8>, config: &AppConfig) {
        match Upload::detect(name, bytes, &config.sheet_name) {
            Ok(upload) => {
                self.origin = Origin::Upload;
                self.upload = Some(upload);
                self.load_selected(config);
            }
            Err(e) => self.fail(e),
        }
    }

    /// Predict on the loaded dataset. Without a dataset nothing runs.
    pub fn run_prediction(&mut self, gateway: &ModelGateway) {
        let Some(dataset) = &self.dataset else {
            self.status = Some(Status::Info("Load a dataset first.".into()));
            return;
        };
        match predict_dataset(dataset, gateway) {
            Ok(outcome) => {
                self.status = Some(Status::Success(format!(
                    "Prediction finished for {} rows",
                    outcome.table.len()
                )));
                self.predictions = Some(outcome);
            }
            Err(e) => {
                self.predictions = None;
                self.fail(e);
            }
        }
    }

    /// Load the cleaned dataset and chart series for the Visualize page.
    pub fn load_visualization(&mut self, config: &AppConfig) {
        self.visual = None;
        let source = match LocalFile::detect(&config.cleaned_data_path, &config.sheet_name) {
            Ok(source) => source,
            Err(e) => return self.fail(e),
        };
        let dataset = match source.load() {
            Ok(dataset) => dataset,
            Err(DashboardError::NotFound(path)) => {
                log::info!("No cleaned dataset at {}", path.display());
                self.status = Some(Status::Info("Cleaned data not found.".into()));
                return;
            }
            Err(e) => return self.fail(e),
        };

        let series = match present::bar_series(&dataset, &config.chart_column, config.chart_rows) {
            Ok(series) => series,
            Err(e) => {
                self.fail(e);
                Vec::new()
            }
        };
        self.visual = Some(VisualData {
            preview: dataset.head(config.preview_rows),
            total_rows: dataset.len(),
            column: config.chart_column.clone(),
            series,
        });
    }

    /// Show `error` on the current page.
    pub fn fail(&mut self, error: DashboardError) {
        log::warn!("{error}");
        self.status = Some(Status::Error(error.user_message()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::fixtures;
    use crate::model::pipeline::LinearPipeline;
    use crate::model::{PredictiveModel, RawPredictions};

    /// Wraps the fixture pipeline and counts calls.
    struct Counting {
        inner: LinearPipeline,
        calls: AtomicUsize,
    }

    impl PredictiveModel for Counting {
        fn predict(&self, features: &Dataset) -> anyhow::Result<RawPredictions> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.predict(features)
        }
    }

    fn counting_gateway() -> (ModelGateway, Arc<Counting>) {
        let model = Arc::new(Counting {
            inner: LinearPipeline::from_json(fixtures::pipeline_json().as_bytes()).unwrap(),
            calls: AtomicUsize::new(0),
        });
        let gateway = ModelGateway::preloaded("model_pipeline.json", model.clone());
        (gateway, model)
    }

    fn is_error(status: &Option<Status>) -> bool {
        matches!(status, Some(Status::Error(_)))
    }

    #[test]
    fn five_complete_rows_predict_end_to_end() {
        let (gateway, model) = counting_gateway();
        let mut state = AppState::default();
        let upload =
            Upload::detect("peserta.csv", fixtures::utbk_csv(5).into_bytes(), "DATABASE").unwrap();

        state.load_dataset(&upload);
        assert_eq!(state.dataset.as_ref().map(Dataset::len), Some(5));

        state.run_prediction(&gateway);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        let outcome = state.predictions.as_ref().unwrap();
        assert_eq!(outcome.table.len(), 5);
        assert_eq!(outcome.table.columns().len(), 6);
        assert_eq!(outcome.means.len(), 6);

        let text = String::from_utf8(outcome.csv.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].split(',').count(), 6);
        assert!(matches!(state.status, Some(Status::Success(_))));
    }

    #[test]
    fn remote_404_leaves_page_without_data() {
        let (gateway, model) = counting_gateway();
        let base = fixtures::serve_once("404 Not Found", Vec::new());
        let url = format!("{base}/NILAI.xlsx");
        let source = RemoteUrl::detect(url, "DATABASE", Duration::from_secs(5))
            .unwrap()
            .direct();
        let mut state = AppState::default();

        state.load_dataset(&source);
        assert!(state.dataset.is_none());
        match &state.status {
            Some(Status::Error(msg)) => assert!(msg.contains("404"), "{msg}"),
            other => panic!("expected an error status, got {other:?}"),
        }

        state.run_prediction(&gateway);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert!(state.predictions.is_none());
    }

    #[test]
    fn missing_columns_are_shown_and_nothing_is_predicted() {
        let (gateway, model) = counting_gateway();
        let mut state = AppState {
            dataset: Some(fixtures::utbk_dataset_without(4, &["Ranking", "RUMPUN"])),
            ..AppState::default()
        };
        state.run_prediction(&gateway);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            state.status,
            Some(Status::Error("Missing columns: Ranking, RUMPUN".into()))
        );
    }

    #[test]
    fn absent_model_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = ModelGateway::new(dir.path().join("model_pipeline.json"));
        let mut state = AppState {
            dataset: Some(fixtures::utbk_dataset(2)),
            ..AppState::default()
        };
        state.run_prediction(&gateway);
        assert!(is_error(&state.status));
        assert!(state.predictions.is_none());
        assert!(state.dataset.is_some());
    }

    #[test]
    fn navigation_discards_page_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            cleaned_data_path: dir.path().join("nilai_utbk_cleaned.csv"),
            autoload_remote: false,
            ..AppConfig::default()
        };
        let mut state = AppState::new(&config);
        state.navigate(Page::UploadAndPredict, &config);
        state.dataset = Some(fixtures::utbk_dataset(3));

        state.navigate(Page::About, &config);
        assert!(state.dataset.is_none());
        assert!(state.status.is_none());

        state.navigate(Page::UploadAndPredict, &config);
        assert!(state.dataset.is_none());
    }

    #[test]
    fn opening_upload_page_loads_the_remote_origin() {
        // The extension is rejected before any request goes out.
        let config = AppConfig {
            data_url: "http://127.0.0.1:9/NILAI.docx".into(),
            ..AppConfig::default()
        };
        let mut state = AppState::new(&config);
        state.navigate(Page::UploadAndPredict, &config);
        assert!(is_error(&state.status));
        assert!(state.dataset.is_none());

        let quiet = AppConfig {
            autoload_remote: false,
            ..config.clone()
        };
        let mut state = AppState::new(&quiet);
        state.navigate(Page::UploadAndPredict, &quiet);
        assert!(state.status.is_none());
    }

    #[test]
    fn opening_upload_page_skips_autoload_for_other_origins() {
        let config = AppConfig {
            data_url: "http://127.0.0.1:9/NILAI.docx".into(),
            ..AppConfig::default()
        };
        let mut state = AppState {
            origin: Origin::Upload,
            ..AppState::new(&config)
        };
        state.navigate(Page::UploadAndPredict, &config);
        assert!(state.status.is_none());
    }

    #[test]
    fn visualize_without_cleaned_data_is_informational() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            cleaned_data_path: dir.path().join("nilai_utbk_cleaned.csv"),
            ..AppConfig::default()
        };
        let mut state = AppState::new(&config);
        state.navigate(Page::Visualize, &config);
        assert!(state.visual.is_none());
        assert_eq!(state.status, Some(Status::Info("Cleaned data not found.".into())));
    }

    #[test]
    fn visualize_plots_chart_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nilai_utbk_cleaned.csv");
        std::fs::write(&path, "PU,PK\n610,580\n,590\n598.5,570\n").unwrap();
        let config = AppConfig {
            cleaned_data_path: path,
            chart_rows: 2,
            ..AppConfig::default()
        };
        let mut state = AppState::new(&config);
        state.navigate(Page::Visualize, &config);

        let visual = state.visual.as_ref().unwrap();
        assert_eq!(visual.total_rows, 3);
        assert_eq!(visual.series, vec![610.0, 0.0]);
        assert!(state.status.is_none());
    }

    #[test]
    fn upload_origin_requires_a_file() {
        let config = AppConfig::default();
        let mut state = AppState {
            origin: Origin::Upload,
            ..AppState::new(&config)
        };
        state.load_selected(&config);
        assert!(is_error(&state.status));

        state.accept_upload("peserta.csv".into(), fixtures::utbk_csv(2).into_bytes(), &config);
        assert_eq!(state.dataset.as_ref().map(Dataset::len), Some(2));
    }
}
