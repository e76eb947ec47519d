use serde::Serialize;

use crate::Payload;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    /// Base URL and endpoint do not form a valid absolute URL. Never retried.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Request failed after the last permitted attempt.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Caller-supplied header name or value is not valid HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// Request body could not be serialized to JSON.
    #[error("encode error: {0}")]
    Encode(String),
    /// Response payload did not match the requested type.
    #[error("decode error: {0}")]
    Decode(String),
    /// Client configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
    /// The call was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiClientError {
    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.status),
            _ => None,
        }
    }

    /// Returns the structured API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Terminal failure of a logical call.
///
/// `status` is the upstream HTTP status, `408` for timeouts and `500` for
/// connection-level failures that carry no status of their own.
#[derive(Clone, Debug, PartialEq, Serialize, thiserror::Error)]
#[error("api error {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub details: ErrorDetails,
}

/// Diagnostic context attached to an [`ApiError`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub url: String,
    pub method: String,
    /// Response body of the failing attempt, when a response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Payload>,
    /// Transport-level failure description, when no response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One-based index of the attempt that produced this error.
    pub attempt: usize,
    pub max_retries: usize,
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        self.status == 408
    }

    /// Renders the error as a JSON object with `name`, `status`, `message` and `details`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "ApiError",
            "status": self.status,
            "message": self.message,
            "details": self.details,
        })
    }
}
