//! Error types for the Seedr API client.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when interacting with the Seedr API.
///
/// Every fallible call in this crate returns this type, so matching on
/// `SeedrError` catches everything; match a specific variant for
/// fine-grained handling.
#[derive(Debug, Error)]
pub enum SeedrError {
    /// Login, device authorization or token refresh was rejected, or a
    /// request still failed authorization after a refresh.
    #[error("authentication failed: {message}")]
    Authentication {
        message: String,
        /// Vendor response body, when the server sent one.
        payload: Option<Value>,
    },

    /// The API answered with an error.
    ///
    /// Seedr reports errors either with a non-2xx status or with a 2xx body
    /// such as `{"result": false, "code": 37, "type": "invalid_magnet"}`.
    #[error("API error{}: {message}", .code.map(|c| format!(" (code {c})")).unwrap_or_default())]
    Api {
        /// HTTP status of the reply.
        status: u16,
        /// Vendor `code` field.
        code: Option<i64>,
        /// Vendor `type` (or `error`) string, unchanged.
        kind: Option<String>,
        message: String,
        payload: Option<Value>,
    },

    /// Transport failure (DNS, connection reset, TLS, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A serialized [`Token`](crate::Token) could not be decoded.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// A parameter was rejected before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Reading a local torrent file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeedrError {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            payload: None,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Vendor error code of an [`Api`](Self::Api) error.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => *code,
            _ => None,
        }
    }

    /// Vendor error type string of an [`Api`](Self::Api) error.
    pub fn api_kind(&self) -> Option<&str> {
        match self {
            Self::Api { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }

    /// Original vendor payload carried by the error, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Api { payload, .. } | Self::Authentication { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }
}

/// Failures decoding a [`Token`](crate::Token) from one of its encodings.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Convenience alias for `Result<T, SeedrError>`.
pub type Result<T> = std::result::Result<T, SeedrError>;
