//! Error taxonomy.
use crate::{ErrorCode, ErrorInfo};
use thiserror::Error;

/// Errors produced while fetching a request.
///
/// These never reach consumers directly: they are converted into an [`ErrorInfo`] and stored as
/// the [`Failed`](crate::AsyncValue::Failed) state of a binding.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The transport failed to produce a response at all (connection failure, aborted request).
    #[error("network error: {0}")]
    Network(String),
    /// The response body is not valid structured data or has the wrong shape.
    #[error("parse error: {0}")]
    Parse(String),
    /// The server answered with a non-success status code.
    #[error("request failed with status {status}")]
    Http { status: u16 },
    /// The request could not be built, for example because of an invalid header.
    #[error("invalid request: {0}")]
    Request(String),
}

impl FetchError {
    /// Determine if a request that failed with this error should be retried.
    ///
    /// Only transport exceptions are retried. Everything else reached the server.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }

    /// Name under which this error is reported to consumers.
    pub fn name(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "NetworkError",
            FetchError::Parse(_) => "ParseError",
            FetchError::Http { .. } => "HttpError",
            FetchError::Request(_) => "RequestError",
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::Parse(error.to_string())
    }
}

impl From<FetchError> for ErrorInfo {
    fn from(error: FetchError) -> Self {
        let code = match &error {
            FetchError::Http { status } => Some(ErrorCode::Number((*status).into())),
            _ => None,
        };
        ErrorInfo {
            name: error.name().into(),
            message: error.to_string(),
            code,
        }
    }
}
