use std::path::Path;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    error::AnalysisError,
    protocol::{parse_error_detail, AnalysisResult},
};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub mod intake;
pub mod projection;

pub use intake::{
    validate_csv_name, Completion, FileSource, IntakeController, IntakeEvent, IntakeRefusal,
    IntakeSession, IntakeState, LoadedAnalysis, SubmitOutcome, UploadTicket,
};
pub use projection::{
    classify_trend, project, zip3_by_index, zip_by_index, Column, Projection, ProjectionError,
    RegressionProjection, TrendProjection, ZipPolicy,
};

pub const DEFAULT_ENDPOINT_URL: &str = "https://imscharf-analyzer.hf.space/predict";
const UPLOAD_FIELD_NAME: &str = "file";
const CSV_MIME_TYPE: &str = "text/csv";

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid endpoint url: {0}")]
    Invalid(#[from] url::ParseError),
    #[error("unsupported endpoint scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
}

pub fn parse_endpoint(raw: &str) -> Result<Url, EndpointError> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(EndpointError::UnsupportedScheme(other.to_string())),
    }
}

/// One CSV export, kept with the filename it was picked or dropped under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl CsvUpload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                AnalysisError::InvalidFile(format!("'{}' has no usable file name", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            AnalysisError::InvalidFile(format!("failed to read '{}': {err}", path.display()))
        })?;
        Ok(Self { filename, bytes })
    }
}

/// The remote prediction collaborator.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, upload: CsvUpload) -> Result<AnalysisResult, AnalysisError>;
}

pub struct AnalysisClient {
    http: Client,
    endpoint: Url,
}

impl AnalysisClient {
    pub fn new(endpoint: Url) -> Self {
        Self::with_http_client(Client::new(), endpoint)
    }

    pub fn with_http_client(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(&self, upload: CsvUpload) -> Result<AnalysisResult, AnalysisError> {
        info!(
            endpoint = %self.endpoint,
            filename = %upload.filename,
            size_bytes = upload.bytes.len(),
            "posting csv to analysis service"
        );
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(CSV_MIME_TYPE)
            .map_err(|err| AnalysisError::InvalidFile(err.to_string()))?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| AnalysisError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let detail = parse_error_detail(&body);
            warn!(status = status.as_u16(), detail = ?detail, "analysis service rejected upload");
            return Err(AnalysisError::server(status.as_u16(), detail));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| AnalysisError::Network(err.to_string()))?;
        let result = AnalysisResult::from_json(&body)?;
        info!(shape = result.shape_name(), "analysis result received");
        Ok(result)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
