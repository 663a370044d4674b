use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Every failure the load → validate → predict → present workflow can hit.
///
/// None of these are fatal: the page controller turns each one into a
/// message and keeps rendering without data.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("fetching {url} failed with HTTP status {status}")]
    Fetch { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("prediction output has {found} columns, expected {expected}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("invalid model artifact: {0}")]
    ModelArtifact(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// Short message suitable for the status line of a page.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::NotFound(path) => {
                format!("File not found: {}", path.display())
            }
            DashboardError::Fetch { status, .. } => {
                format!(
                    "Could not load the remote dataset (HTTP {status}). \
                     Check the URL or file name."
                )
            }
            DashboardError::Transport { message, .. } => {
                format!("Could not reach the remote dataset: {message}")
            }
            DashboardError::Parse(msg) => format!("Could not read the table: {msg}"),
            DashboardError::MissingColumns(cols) => {
                format!("Missing columns: {}", cols.join(", "))
            }
            DashboardError::Inference(msg) => format!("Prediction failed: {msg}"),
            DashboardError::ShapeMismatch { expected, found } => format!(
                "The model returned {found} output columns but {expected} were expected."
            ),
            DashboardError::ModelArtifact(msg) => format!("The model could not be loaded: {msg}"),
            DashboardError::Config(msg) => format!("Configuration error: {msg}"),
            DashboardError::Io(e) => format!("File error: {e}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_every_name() {
        let err = DashboardError::MissingColumns(vec!["Ranking".into(), "RUMPUN".into()]);
        assert_eq!(err.to_string(), "missing required columns: Ranking, RUMPUN");
        assert_eq!(err.user_message(), "Missing columns: Ranking, RUMPUN");
    }

    #[test]
    fn fetch_message_carries_status() {
        let err = DashboardError::Fetch {
            url: "http://example.invalid/data.xlsx".into(),
            status: 404,
        };
        assert!(err.to_string().contains("404"));
        assert!(err.user_message().contains("HTTP 404"));
    }
}
