//! Errors from the REST client layer

use serde::Deserialize;
use stratus_core::provider::{ErrorKind, ProviderError};

/// Error returned by an ARM request
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{method} {url}: not found")]
    NotFound { method: String, url: String },

    #[error("{method} {url}: unexpected status {status}: {code}: {message}")]
    Remote {
        method: String,
        url: String,
        status: u16,
        code: String,
        message: String,
    },

    #[error("sending request: {0}")]
    Transport(String),

    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("building request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("encoding request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// True when the remote answered 404
    pub fn was_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

impl From<ApiError> for ProviderError {
    fn from(e: ApiError) -> Self {
        let kind = match &e {
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::Remote { .. } => ErrorKind::Remote,
            ApiError::Transport(_)
            | ApiError::Decode { .. }
            | ApiError::Url(_)
            | ApiError::Encode(_) => ErrorKind::Transport,
        };
        ProviderError::new(kind, e.to_string()).with_cause(e)
    }
}

/// The ARM error envelope `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: ErrorDetail,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorDetail {
    /// Decode an error body; anything unparseable becomes the message
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) if !envelope.error.code.is_empty() || !envelope.error.message.is_empty() => {
                envelope.error
            }
            _ => ErrorDetail {
                code: "Unknown".to_string(),
                message: body.chars().take(200).collect(),
            },
        }
    }
}
