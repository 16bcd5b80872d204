//! Client error types.

use thiserror::Error;

/// Client error type.
///
/// Request-level failures (`Http`, `Api`, `Validation`, ...) are raised before a
/// stream is open. The streaming variants (`Transport`, `Decode`, `Server`,
/// `ServerEvent`, `Cancelled`) are terminal for the stream that produced them.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization of a non-streaming body failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from server.
        code: String,
        /// Error message from server.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request rejected locally before it was sent.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Reading the next line from the response body failed.
    #[error("error reading line: {0}")]
    Transport(String),

    /// A `data:` line did not decode into an event.
    #[error("error decoding event: {0}")]
    Decode(#[source] serde_json::Error),

    /// Out-of-band error frame written into the stream body.
    #[error("server error: {message} (code: {code}, status: {status})")]
    Server {
        /// Error code from the frame.
        code: String,
        /// Error message from the frame.
        message: String,
        /// Status carried by the frame.
        status: u16,
    },

    /// The stream delivered an event with the `error` discriminator.
    #[error("error streaming event: {raw}")]
    ServerEvent {
        /// Error code, when the event carried one.
        code: Option<String>,
        /// Error message, when the event carried one.
        message: Option<String>,
        /// Status, when the event carried one.
        status: Option<u16>,
        /// The undecoded event payload.
        raw: String,
    },

    /// The caller's cancellation token fired.
    #[error("stream cancelled")]
    Cancelled,
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_)) || matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_)) || matches!(self, Error::Api { status: 401, .. })
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }

    /// Check if the server reported an error inside an open stream, either as
    /// an out-of-band frame or as an `error` event.
    pub fn is_stream_server_error(&self) -> bool {
        matches!(self, Error::Server { .. } | Error::ServerEvent { .. })
    }

    /// Check if the stream ended because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// The server-side error code, for the variants that carry one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } | Error::Server { code, .. } => Some(code),
            Error::ServerEvent { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error response body returned by the server for non-2xx responses.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
