//! The network seam.
//!
//! [`Transport`] is the single boundary to the outside network stack: it
//! receives a URL and a transport-ready request configuration and returns the
//! raw response. The default implementation drives `reqwest`; tests and
//! integrators can substitute their own.

use crate::{request::RequestInit, Result};
use futures_util::future::BoxFuture;
use http::{HeaderMap, StatusCode};
use url::Url;

/// A raw HTTP response as produced by a transport, before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The final URL the response came from.
    pub url: String,
    /// The HTTP status code.
    pub status: StatusCode,
    /// The status text (canonical reason phrase).
    pub status_text: String,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body, read to completion as text.
    pub body: String,
}

/// A network-call primitive.
///
/// Every call goes through the network exactly once; there is no retry
/// logic at this layer or above it.
pub trait Transport: Send + Sync {
    /// Sends the request and reads the full response body.
    fn send<'a>(&'a self, url: &'a str, init: &'a RequestInit) -> BoxFuture<'a, Result<RawResponse>>;
}

/// The default [`Transport`], backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport from an existing `reqwest` client, preserving its
    /// connection pool and TLS configuration.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(&'a self, url: &'a str, init: &'a RequestInit) -> BoxFuture<'a, Result<RawResponse>> {
        Box::pin(async move {
            let url = Url::parse(url)?;

            tracing::debug!(method = %init.method, url = %url, "Executing HTTP request");

            let mut request = self
                .client
                .request(init.method.clone(), url)
                .headers(init.headers.clone());

            if let Some(timeout) = init.timeout {
                request = request.timeout(timeout);
            }

            if let Some(body) = &init.body {
                request = request.body(body.clone());
            }

            let response = request.send().await?;

            let status = response.status();
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            let headers = response.headers().clone();
            let final_url = response.url().to_string();
            let body = response.text().await?;

            Ok(RawResponse {
                url: final_url,
                status,
                status_text,
                headers,
                body,
            })
        })
    }
}
