//! Error types for typed API calls.
//!
//! The taxonomy distinguishes three failure categories that callers handle
//! differently: an HTTP failure (a response arrived with a non-2xx status,
//! surfaced as [`ApiError`] tagged with the originating operation), a network
//! fault (no response was obtained at all), and a decode fault (the server
//! promised JSON but sent something else).

use crate::response::ResponseBody;
use http::{HeaderMap, StatusCode};

/// Identity tag for one generated operation.
///
/// Every operation produced by `path().method().create()` gets a
/// process-unique id, and HTTP errors raised through that operation carry it.
/// Comparing tags distinguishes errors from different operations at runtime,
/// not merely by field shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(pub(crate) u64);

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// An HTTP failure: the server responded with a non-2xx status.
///
/// Carries the full normalized response so nothing is lost on the error
/// path, plus the identity of the operation that raised it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("HTTP {status} for {url}")]
pub struct ApiError {
    /// The resolved request URL.
    pub url: String,
    /// The HTTP status code.
    pub status: StatusCode,
    /// The status text (canonical reason phrase).
    pub status_text: String,
    /// The response headers.
    pub headers: HeaderMap,
    /// The decoded response body.
    pub data: ResponseBody,
    /// The operation this error was raised through, once it has crossed an
    /// operation boundary. `None` for errors raised below that boundary
    /// (e.g. inside a middleware that performs its own request).
    pub operation: Option<OperationId>,
}

impl ApiError {
    /// Returns `true` if this error was raised through the given operation.
    pub fn is_from(&self, operation: OperationId) -> bool {
        self.operation == Some(operation)
    }
}

/// The main error type for API calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A network-level fault: the transport never produced an HTTP response
    /// (connection refused, DNS failure, ...). Deliberately not coerced into
    /// [`ApiError`] so callers can tell "got an HTTP error" apart from
    /// "never got a response".
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server responded with a non-2xx status.
    #[error(transparent)]
    Http(#[from] ApiError),

    /// The response declared `application/json` but the body failed to
    /// parse. Fatal; never silently downgraded to text.
    #[error("Failed to decode JSON response (status {status}) from {url}: {source}")]
    Decode {
        /// The resolved request URL.
        url: String,
        /// The HTTP status code of the response.
        status: StatusCode,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A path template placeholder had no matching payload key.
    #[error("Missing path parameter `{name}` for path `{path}`")]
    MissingPathParam {
        /// The placeholder name.
        name: String,
        /// The path template it appears in.
        path: String,
    },

    /// Invalid client or request configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request payload could not be serialized to JSON.
    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns the HTTP error details if this is an HTTP failure.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Http(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http(e) => Some(e.status),
            Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A specialized `Result` type for API calls.
pub type Result<T> = std::result::Result<T, Error>;
