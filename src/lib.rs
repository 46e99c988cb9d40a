//! # opfetch - A typed OpenAPI-style HTTP client
//!
//! opfetch turns a logical operation (path template + method + payload) into
//! an HTTP request and a normalized response or typed error. One payload is
//! split into path parameters, query parameters, and body; middlewares wrap
//! the network call in an onion; and HTTP outcomes are classified into a
//! success result or a per-operation typed failure.
//!
//! ## Quick Start
//!
//! ```no_run
//! use http::Method;
//! use opfetch::{FetchConfig, Fetcher, RequestOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), opfetch::Error> {
//!     let fetcher = Fetcher::new();
//!     fetcher.configure(FetchConfig {
//!         base_url: Some("https://api.backend.dev".to_string()),
//!         init: Some(RequestOptions::new().header("Authorization", "Bearer token")?),
//!         ..FetchConfig::default()
//!     });
//!
//!     // One callable per (path, method) pair. Path placeholders consume
//!     // their payload keys; for GET the rest becomes the query string.
//!     let find_pet = fetcher.path("/pets/{id}").method(Method::GET).create();
//!     let response = find_pet.call(json!({ "id": 7, "expand": true }), None).await?;
//!     println!("status: {}", response.status);
//!
//!     // Body-sending methods declare which keys go to the query instead.
//!     let update = fetcher
//!         .path("/pets/{id}")
//!         .method(Method::POST)
//!         .create_with_query(&["dryRun"]);
//!     let response = update
//!         .call(json!({ "id": 7, "dryRun": true, "name": "Turtle" }), None)
//!         .await?;
//!     println!("updated: {:?}", response.data);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Non-2xx responses raise [`Error::Http`] carrying the full normalized
//! response, tagged with the identity of the operation that raised it.
//! Transport faults that never produced an HTTP response stay
//! [`Error::Network`], so the two are always distinguishable:
//!
//! ```no_run
//! use http::Method;
//! use opfetch::{Error, Fetcher};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Error> {
//! # let fetcher = Fetcher::new();
//! let find_pet = fetcher.path("/pets/{id}").method(Method::GET).create();
//!
//! match find_pet.call(json!({ "id": 7 }), None).await {
//!     Ok(response) => println!("found: {:?}", response.data),
//!     Err(Error::Http(e)) if e.is_from(find_pet.id()) => {
//!         eprintln!("API rejected the call: {} {:?}", e.status, e.data);
//!     }
//!     Err(Error::Network(e)) => eprintln!("never reached the server: {}", e),
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Middlewares
//!
//! Middlewares registered with [`Fetcher::use_middleware`] run in
//! registration order before the network call and in reverse order after it.
//! Each one can rewrite the outgoing request, mutate the normalized
//! response, short-circuit, or transform errors. See [`Middleware`].
//!
//! ## Features
//!
//! - **One payload, three destinations** - path substitution, declared query
//!   keys, and JSON body from a single value, with the caller's value never
//!   mutated
//! - **Deterministic query serialization** - explode-style flattening with a
//!   configurable array convention ([`query::ArrayFormat`])
//! - **Onion middleware chain** - request/response interception around a
//!   substitutable transport
//! - **Typed failures** - per-operation error identity without dynamic
//!   subclassing
//! - **Structured logging** - request/response tracing via `tracing`

mod client;
mod error;
mod middleware;
pub mod payload;
pub mod query;
mod request;
mod response;
pub mod transport;

pub use client::{FetchConfig, Fetcher, MethodBuilder, Operation, PathBuilder};
pub use error::{ApiError, Error, OperationId, Result};
pub use middleware::{Middleware, Next};
pub use payload::Payload;
pub use request::{OperationDescriptor, RequestInit, RequestOptions};
pub use response::{ApiResponse, ResponseBody};
pub use transport::{RawResponse, ReqwestTransport, Transport};
