use revan_core::FailureKind;
use thiserror::Error;

/// Errors produced while analyzing a single review.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Review text was empty or whitespace-only. Raised before any model call.
    #[error("review text is empty")]
    EmptyInput,

    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server does not have the configured model.
    #[error("model '{model}' is not installed on the server")]
    ModelNotFound { model: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The model answered, but with nothing to parse.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The response envelope could not be decoded.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl AnalyzerError {
    /// Classify this error for the batch failure list.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            AnalyzerError::EmptyInput => FailureKind::EmptyInput,
            AnalyzerError::Http(e) => {
                if e.is_timeout() {
                    FailureKind::Timeout
                } else if e.is_decode() {
                    FailureKind::MalformedResponse
                } else if e.status().is_some() {
                    FailureKind::HttpStatus
                } else {
                    FailureKind::Unreachable
                }
            }
            AnalyzerError::ModelNotFound { .. } => FailureKind::ModelNotFound,
            AnalyzerError::UnexpectedStatus { .. } => FailureKind::HttpStatus,
            AnalyzerError::EmptyResponse => FailureKind::EmptyResponse,
            AnalyzerError::Deserialize { .. } => FailureKind::MalformedResponse,
            AnalyzerError::InvalidUrl { .. } => FailureKind::Unreachable,
        }
    }

    /// Whether another attempt might succeed: connect errors, timeouts,
    /// throttling and server errors.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            AnalyzerError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            AnalyzerError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            AnalyzerError::EmptyInput
            | AnalyzerError::ModelNotFound { .. }
            | AnalyzerError::EmptyResponse
            | AnalyzerError::Deserialize { .. }
            | AnalyzerError::InvalidUrl { .. } => false,
        }
    }
}

/// Errors that prevent a batch from starting.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("duplicate review id '{0}' in batch input")]
    DuplicateReviewId(String),
}
