use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when neither the server nor the status code gives anything better.
pub const GENERIC_FAILURE_MESSAGE: &str = "Ocorreu um erro ao processar o arquivo.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkFailure,
    ServerError,
    MalformedResponse,
    InvalidFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("analysis service responded with status {status}")]
    Server { status: u16, detail: Option<String> },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid file: {0}")]
    InvalidFile(String),
}

impl AnalysisError {
    pub fn server(status: u16, detail: Option<String>) -> Self {
        Self::Server { status, detail }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkFailure,
            Self::Server { .. } => ErrorKind::ServerError,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::InvalidFile(_) => ErrorKind::InvalidFile,
        }
    }

    /// Message suitable for inline display next to the upload control.
    ///
    /// A server-supplied `detail` wins, then a status-coded message, then the
    /// generic failure text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Server {
                status,
                detail: None,
            } => format!("Falha no envio com status {status}"),
            Self::InvalidFile(reason) => reason.clone(),
            Self::Network(_) | Self::MalformedResponse(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
