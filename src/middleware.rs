//! Middleware around the network call.
//!
//! Middlewares wrap the transport in an onion: they run in registration
//! order on the way in, and code after the `next` call runs in reverse
//! registration order on the way out. A middleware may rewrite the URL or
//! request configuration before calling [`Next::run`], mutate the normalized
//! response afterwards, short-circuit by not calling `next` at all, or
//! return an error that propagates to outer middlewares and the caller.

use crate::{
    request::RequestInit,
    response::{classify, ApiResponse},
    transport::Transport,
    Result,
};
use futures_util::future::BoxFuture;
use std::sync::Arc;

/// A middleware wrapping the network call.
///
/// # Examples
///
/// ```
/// use futures_util::future::BoxFuture;
/// use http::HeaderValue;
/// use opfetch::{ApiResponse, Middleware, Next, RequestInit};
///
/// struct AuthHeader;
///
/// impl Middleware for AuthHeader {
///     fn handle<'a>(
///         &'a self,
///         url: String,
///         mut init: RequestInit,
///         next: Next<'a>,
///     ) -> BoxFuture<'a, opfetch::Result<ApiResponse>> {
///         Box::pin(async move {
///             init.headers
///                 .insert("authorization", HeaderValue::from_static("Bearer token"));
///             next.run(url, init).await
///         })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    /// Handles one request, optionally delegating to the rest of the chain.
    fn handle<'a>(
        &'a self,
        url: String,
        init: RequestInit,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ApiResponse>>;
}

impl<F> Middleware for F
where
    F: for<'a> Fn(String, RequestInit, Next<'a>) -> BoxFuture<'a, Result<ApiResponse>>
        + Send
        + Sync,
{
    fn handle<'a>(
        &'a self,
        url: String,
        init: RequestInit,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<ApiResponse>> {
        self(url, init, next)
    }
}

/// The remainder of a middleware chain.
///
/// Calling [`Next::run`] invokes the next middleware in registration order;
/// past the last one it performs the network call and classifies the
/// outcome.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware>], transport: &'a dyn Transport) -> Self {
        Self { chain, transport }
    }

    /// Runs the rest of the chain and ultimately the network call.
    pub fn run(self, url: String, init: RequestInit) -> BoxFuture<'a, Result<ApiResponse>> {
        Box::pin(async move {
            match self.chain.split_first() {
                Some((current, rest)) => {
                    current
                        .handle(url, init, Next::new(rest, self.transport))
                        .await
                }
                None => {
                    let raw = self.transport.send(&url, &init).await?;
                    classify(raw)
                }
            }
        })
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len())
            .finish()
    }
}
