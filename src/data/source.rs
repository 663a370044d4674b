use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;

use super::loader::{parse_table, TableFormat};
use super::model::Dataset;
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// DataSource – one capability, three origins
// ---------------------------------------------------------------------------

/// Somewhere a dataset can be loaded from. The caller picks exactly one
/// implementation per load; all of them decode through [`parse_table`].
pub trait DataSource {
    /// Read and decode the table. The origin itself is never modified.
    fn load(&self) -> Result<Dataset>;

    /// Human readable origin, used in status lines and logs.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// Local file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    format: TableFormat,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>, format: TableFormat) -> Self {
        LocalFile {
            path: path.into(),
            format,
        }
    }

    /// Format picked from the file extension.
    pub fn detect(path: impl Into<PathBuf>, sheet: &str) -> Result<Self> {
        let path = path.into();
        let format = TableFormat::from_name(&path.to_string_lossy(), sheet)?;
        Ok(LocalFile::new(path, format))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for LocalFile {
    fn load(&self) -> Result<Dataset> {
        if !self.path.exists() {
            return Err(DashboardError::NotFound(self.path.clone()));
        }
        let bytes = std::fs::read(&self.path)?;
        parse_table(&bytes, &self.format)
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

// ---------------------------------------------------------------------------
// Remote URL
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RemoteUrl {
    url: String,
    format: TableFormat,
    timeout: Duration,
    use_system_proxy: bool,
}

impl RemoteUrl {
    pub fn new(url: impl Into<String>, format: TableFormat, timeout: Duration) -> Self {
        RemoteUrl {
            url: url.into(),
            format,
            timeout,
            use_system_proxy: true,
        }
    }

    /// Format picked from the extension of the URL path.
    pub fn detect(url: impl Into<String>, sheet: &str, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let format = TableFormat::from_name(&url, sheet)?;
        Ok(RemoteUrl::new(url, format, timeout))
    }

    /// Ignore `HTTP_PROXY` / `HTTPS_PROXY` and connect directly.
    #[cfg(test)]
    pub fn direct(mut self) -> Self {
        self.use_system_proxy = false;
        self
    }

    fn client(&self) -> Result<Client> {
        let mut builder = Client::builder().timeout(self.timeout);
        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }
        builder.build().map_err(|e| DashboardError::Transport {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }
}

impl DataSource for RemoteUrl {
    fn load(&self) -> Result<Dataset> {
        let url = raw_github_url(&self.url);
        let transport = |e: reqwest::Error| DashboardError::Transport {
            url: url.clone(),
            message: e.to_string(),
        };

        log::info!("Fetching dataset from {url}");
        let response = self.client()?.get(&url).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Fetch {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().map_err(transport)?;
        parse_table(&body, &self.format)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Rewrite a `github.com/<owner>/<repo>/blob/<ref>/<path>` page URL to the
/// raw file URL. Anything else is returned unchanged.
pub fn raw_github_url(url: &str) -> String {
    let Some(rest) = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
    else {
        return url.to_string();
    };
    let mut parts = rest.splitn(4, '/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), Some("blob"), Some(tail)) => {
            format!("https://raw.githubusercontent.com/{owner}/{repo}/{tail}")
        }
        _ => url.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// A file handed over by the user (file dialog or drag-and-drop), already in
/// memory.
#[derive(Debug, Clone)]
pub struct Upload {
    name: String,
    bytes: Vec<u8>,
    format: TableFormat,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, format: TableFormat) -> Self {
        Upload {
            name: name.into(),
            bytes,
            format,
        }
    }

    /// Format picked from the uploaded file name.
    pub fn detect(name: impl Into<String>, bytes: Vec<u8>, sheet: &str) -> Result<Self> {
        let name = name.into();
        let format = TableFormat::from_name(&name, sheet)?;
        Ok(Upload::new(name, bytes, format))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl DataSource for Upload {
    fn load(&self) -> Result<Dataset> {
        parse_table(&self.bytes, &self.format)
    }

    fn describe(&self) -> String {
        format!("upload {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::fixtures;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn missing_local_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nilai_utbk_cleaned.csv");
        let err = LocalFile::detect(&path, "DATABASE").unwrap().load().unwrap_err();
        match err {
            DashboardError::NotFound(p) => assert_eq!(p, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn local_csv_loads() {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        file.write_all(fixtures::utbk_csv(3).as_bytes()).unwrap();
        let ds = LocalFile::detect(file.path(), "DATABASE")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.columns().len(), 13);
    }

    #[test]
    fn malformed_upload_is_a_parse_error() {
        let upload = Upload::detect("peserta.csv", b"a,b\n1,2,3\n".to_vec(), "DATABASE").unwrap();
        assert!(matches!(upload.load(), Err(DashboardError::Parse(_))));
        assert_eq!(upload.describe(), "upload peserta.csv");
    }

    #[test]
    fn upload_with_unknown_extension_is_rejected() {
        let err = Upload::detect("model.pkl", Vec::new(), "DATABASE").unwrap_err();
        assert!(matches!(err, DashboardError::Parse(_)));
    }

    #[test]
    fn remote_404_is_a_fetch_error() {
        let base = fixtures::serve_once("404 Not Found", Vec::new());
        let source = RemoteUrl::detect(format!("{base}/NILAI.xlsx"), "DATABASE", TIMEOUT)
            .unwrap()
            .direct();
        match source.load().unwrap_err() {
            DashboardError::Fetch { status, .. } => assert_eq!(status, 404),
            other => panic!("expected Fetch, got {other:?}"),
        }
    }

    #[test]
    fn remote_csv_body_is_parsed() {
        let base = fixtures::serve_once("200 OK", fixtures::utbk_csv(4).into_bytes());
        let ds = RemoteUrl::detect(format!("{base}/nilai.csv"), "DATABASE", TIMEOUT)
            .unwrap()
            .direct()
            .load()
            .unwrap();
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn undecodable_remote_body_is_a_parse_error() {
        let base = fixtures::serve_once("200 OK", b"<html>not a workbook</html>".to_vec());
        let err = RemoteUrl::detect(format!("{base}/NILAI.xlsx"), "DATABASE", TIMEOUT)
            .unwrap()
            .direct()
            .load()
            .unwrap_err();
        assert!(matches!(err, DashboardError::Parse(_)), "{err:?}");
    }

    #[test]
    fn github_blob_urls_point_at_raw_content() {
        assert_eq!(
            raw_github_url("https://github.com/acme/utbk/blob/main/data/NILAI.xlsx"),
            "https://raw.githubusercontent.com/acme/utbk/main/data/NILAI.xlsx"
        );
        assert_eq!(
            raw_github_url("https://raw.githubusercontent.com/acme/utbk/main/x.csv"),
            "https://raw.githubusercontent.com/acme/utbk/main/x.csv"
        );
        assert_eq!(
            raw_github_url("https://github.com/acme/utbk"),
            "https://github.com/acme/utbk"
        );
    }
}
