use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DashboardError, Result};

/// Environment variable pointing at a JSON config file.
pub const CONFIG_ENV: &str = "UTBK_DASHBOARD_CONFIG";
/// Config file picked up from the working directory when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "utbk-dashboard.json";

const DEFAULT_DATA_URL: &str =
    "https://github.com/rusdiahmad/streamlit-portfolio-utbk/blob/main/data/NILAI_UTBK_ANGK_4.xlsx";

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Everything the dashboard reads from outside the binary. Every field has a
/// default so an empty `{}` file is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Serialized prediction pipeline.
    pub model_path: PathBuf,
    /// Dataset fetched by the remote origin.
    pub data_url: String,
    /// Fetch `data_url` as soon as the Upload & Predict page opens.
    pub autoload_remote: bool,
    /// Sheet read from spreadsheet inputs.
    pub sheet_name: String,
    /// Cleaned dataset shown on the Visualize page.
    pub cleaned_data_path: PathBuf,
    pub http_timeout_secs: u64,
    /// Rows shown in dataset and prediction previews.
    pub preview_rows: usize,
    /// Rows plotted on the Visualize page.
    pub chart_rows: usize,
    /// Column plotted on the Visualize page.
    pub chart_column: String,
    /// Text of the About page.
    pub about: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model_pipeline.json"),
            data_url: DEFAULT_DATA_URL.to_string(),
            autoload_remote: true,
            sheet_name: "DATABASE".to_string(),
            cleaned_data_path: PathBuf::from("nilai_utbk_cleaned.csv"),
            http_timeout_secs: 30,
            preview_rows: 5,
            chart_rows: 100,
            chart_column: "PU".to_string(),
            about: "Portfolio dashboard predicting UTBK subtest scores (PU, PK, PPU, PBM, \
                    LIND, LING) per study programme from tryout results."
                .to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file (if any), then environment overrides.
    pub fn load() -> Result<Self> {
        let file = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            });

        let mut config = match file {
            Some(path) => {
                log::info!("Reading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file. Relative paths inside it resolve against the
    /// file's own directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DashboardError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            config.model_path = resolve(base, &config.model_path);
            config.cleaned_data_path = resolve(base, &config.cleaned_data_path);
        }
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| DashboardError::Config(e.to_string()))
    }

    /// `UTBK_MODEL_PATH`, `UTBK_DATA_URL` and `UTBK_SHEET_NAME` win over the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("UTBK_MODEL_PATH") {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("UTBK_DATA_URL") {
            self.data_url = v;
        }
        if let Some(v) = lookup("UTBK_SHEET_NAME") {
            self.sheet_name = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_timeout_secs == 0 {
            return Err(DashboardError::Config("http_timeout_secs must be positive".into()));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(DashboardError::Config("sheet_name must not be empty".into()));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
