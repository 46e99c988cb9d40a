//! Response normalization.
//!
//! The classifier turns a raw transport response into an [`ApiResponse`]:
//! it decodes the body according to status and content type, and raises a
//! typed [`ApiError`](crate::ApiError) for non-2xx statuses.

use crate::{transport::RawResponse, ApiError, Error, Result};
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The decoded body of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No content (status 204, regardless of content type).
    Empty,

    /// A parsed JSON document.
    Json(Value),

    /// Raw text that was not JSON.
    Text(String),
}

impl ResponseBody {
    /// Returns the parsed JSON value, if the body was JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the raw text, if the body was non-JSON text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `true` for an absent body.
    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseBody::Empty)
    }

    /// Deserializes a JSON body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the body is not JSON or does not
    /// match the target type.
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            ResponseBody::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| Error::Serialization(e.to_string())),
            ResponseBody::Empty => Err(Error::Serialization(
                "response body is empty".to_string(),
            )),
            ResponseBody::Text(_) => Err(Error::Serialization(
                "response body is not JSON".to_string(),
            )),
        }
    }
}

/// A normalized HTTP response.
///
/// # Examples
///
/// ```no_run
/// use http::Method;
/// use opfetch::Fetcher;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), opfetch::Error> {
/// let fetcher = Fetcher::new();
/// let find_pet = fetcher.path("/pets/{id}").method(Method::GET).create();
///
/// let response = find_pet.call(json!({ "id": 7 }), None).await?;
/// assert!(response.ok);
/// println!("status: {} {}", response.status, response.status_text);
/// println!("body: {:?}", response.data);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// The resolved request URL.
    pub url: String,

    /// `true` iff the status is in the 2xx range.
    pub ok: bool,

    /// The HTTP status code.
    pub status: StatusCode,

    /// The status text (canonical reason phrase).
    pub status_text: String,

    /// The response headers.
    pub headers: HeaderMap,

    /// The decoded body.
    pub data: ResponseBody,
}

impl ApiResponse {
    /// Deserializes the decoded body into a typed value.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        self.data.json_as()
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Decodes the body of a raw response.
///
/// 204 means no content whatever the headers say. A declared JSON content
/// type must parse or the whole call fails. Anything else is read as text
/// with a best-effort JSON upgrade.
fn decode_body(raw: &RawResponse) -> Result<ResponseBody> {
    if raw.status == StatusCode::NO_CONTENT {
        return Ok(ResponseBody::Empty);
    }

    let content_type = raw
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.contains("application/json") {
        let value = serde_json::from_str(&raw.body).map_err(|source| Error::Decode {
            url: raw.url.clone(),
            status: raw.status,
            source,
        })?;
        return Ok(ResponseBody::Json(value));
    }

    match serde_json::from_str(&raw.body) {
        Ok(value) => Ok(ResponseBody::Json(value)),
        Err(_) => Ok(ResponseBody::Text(raw.body.clone())),
    }
}

/// Classifies a raw transport response into a success or a typed failure.
///
/// Returns the normalized [`ApiResponse`] for 2xx statuses and
/// [`Error::Http`] otherwise. The operation tag on the error is attached
/// later, at the operation boundary.
pub(crate) fn classify(raw: RawResponse) -> Result<ApiResponse> {
    let data = decode_body(&raw)?;
    let ok = raw.status.is_success();

    tracing::info!(
        status = raw.status.as_u16(),
        url = %raw.url,
        "Received HTTP response"
    );

    let response = ApiResponse {
        url: raw.url,
        ok,
        status: raw.status,
        status_text: raw.status_text,
        headers: raw.headers,
        data,
    };

    if response.ok {
        return Ok(response);
    }

    if response.status.is_client_error() {
        tracing::error!(status = response.status.as_u16(), url = %response.url, "Client error (4xx)");
    } else if response.status.is_server_error() {
        tracing::warn!(status = response.status.as_u16(), url = %response.url, "Server error (5xx)");
    }

    Err(Error::Http(ApiError {
        url: response.url,
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        data: response.data,
        operation: None,
    }))
}
