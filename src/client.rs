//! The client builder and generated operations.
//!
//! [`Fetcher`] holds the shared configuration (base URL, default options,
//! middleware list) and mints one callable [`Operation`] per (path, method)
//! pair. Configuration is read fresh on every call, so reconfiguring between
//! calls is immediately observable on subsequent calls; it never changes a
//! call already in flight.

use crate::{
    middleware::{Middleware, Next},
    payload::Payload,
    query::ArrayFormat,
    request::{assemble, OperationDescriptor, RequestOptions},
    response::ApiResponse,
    transport::{ReqwestTransport, Transport},
    Error, OperationId, Result,
};
use http::Method;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, PoisonError, RwLock,
};

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration applied wholesale by [`Fetcher::configure`].
///
/// Unset fields reset to their defaults: empty base URL, empty default
/// options, no middlewares, [`ArrayFormat::Repeated`].
#[derive(Default)]
pub struct FetchConfig {
    /// Base URL prepended to every operation path.
    pub base_url: Option<String>,

    /// Default request options, merged under per-call options.
    pub init: Option<RequestOptions>,

    /// The middleware list, replacing any previously registered.
    pub middlewares: Option<Vec<Arc<dyn Middleware>>>,

    /// The query array serialization convention.
    pub array_format: Option<ArrayFormat>,
}

impl std::fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchConfig")
            .field("base_url", &self.base_url)
            .field("init", &self.init)
            .field(
                "middlewares",
                &self.middlewares.as_ref().map(|m| m.len()),
            )
            .field("array_format", &self.array_format)
            .finish()
    }
}

struct FetcherState {
    base_url: String,
    default_options: RequestOptions,
    middlewares: Vec<Arc<dyn Middleware>>,
    array_format: ArrayFormat,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for FetcherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherState")
            .field("base_url", &self.base_url)
            .field("middlewares", &self.middlewares.len())
            .field("array_format", &self.array_format)
            .finish()
    }
}

/// The stateful factory for typed operations.
///
/// # Examples
///
/// ```no_run
/// use http::Method;
/// use opfetch::{FetchConfig, Fetcher, RequestOptions};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), opfetch::Error> {
/// let fetcher = Fetcher::new();
/// fetcher.configure(FetchConfig {
///     base_url: Some("https://api.backend.dev".to_string()),
///     init: Some(RequestOptions::new().header("Authorization", "Bearer token")?),
///     ..FetchConfig::default()
/// });
///
/// let find_pet = fetcher.path("/pets/{id}").method(Method::GET).create();
/// let response = find_pet.call(json!({ "id": 7 }), None).await?;
/// println!("found: {:?}", response.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Fetcher {
    state: Arc<RwLock<FetcherState>>,
}

impl Fetcher {
    /// Creates a fetcher with the default `reqwest`-backed transport.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    /// Creates a fetcher with a substitute transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            state: Arc::new(RwLock::new(FetcherState {
                base_url: String::new(),
                default_options: RequestOptions::default(),
                middlewares: Vec::new(),
                array_format: ArrayFormat::default(),
                transport,
            })),
        }
    }

    /// Replaces base URL, default options, middleware list, and array format
    /// wholesale. The transport is untouched.
    ///
    /// Expected to be called during setup, not under concurrent in-flight
    /// calls; calls already past their configuration read are unaffected.
    pub fn configure(&self, config: FetchConfig) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.base_url = config.base_url.unwrap_or_default();
        state.default_options = config.init.unwrap_or_default();
        state.middlewares = config.middlewares.unwrap_or_default();
        state.array_format = config.array_format.unwrap_or_default();
    }

    /// Appends one middleware to the live list without replacing the others.
    pub fn use_middleware<M: Middleware + 'static>(&self, middleware: M) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.middlewares.push(Arc::new(middleware));
    }

    /// Starts the builder chain for one operation path.
    pub fn path(&self, path: impl Into<String>) -> PathBuilder {
        PathBuilder {
            state: Arc::clone(&self.state),
            path: path.into(),
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Fetcher")
            .field("base_url", &state.base_url)
            .field("middlewares", &state.middlewares.len())
            .finish()
    }
}

/// Builder step holding the operation path.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    state: Arc<RwLock<FetcherState>>,
    path: String,
}

impl PathBuilder {
    /// Selects the HTTP method for this operation.
    pub fn method(self, method: Method) -> MethodBuilder {
        MethodBuilder {
            state: self.state,
            path: self.path,
            method,
        }
    }
}

/// Builder step holding path and method.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    state: Arc<RwLock<FetcherState>>,
    path: String,
    method: Method,
}

impl MethodBuilder {
    /// Creates the operation with no declared query keys.
    pub fn create(self) -> Operation {
        self.create_with_query(&[])
    }

    /// Creates the operation, declaring which payload keys are serialized as
    /// query parameters for body-sending methods.
    pub fn create_with_query(self, query_keys: &[&str]) -> Operation {
        Operation {
            state: self.state,
            path: self.path,
            method: self.method,
            query_keys: query_keys.iter().map(|k| (*k).to_string()).collect(),
            id: OperationId(NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }
}

/// One callable endpoint: a (path, method) pair bound to its fetcher.
///
/// Errors raised through an operation are tagged with its [`OperationId`],
/// so failures from different operations are distinguishable at runtime.
#[derive(Clone)]
pub struct Operation {
    state: Arc<RwLock<FetcherState>>,
    path: String,
    method: Method,
    query_keys: Vec<String>,
    id: OperationId,
}

impl Operation {
    /// This operation's identity tag.
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// The operation's path template.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The operation's HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Runs the full pipeline: assemble the request, execute the middleware
    /// chain and the network call, classify the response.
    ///
    /// # Errors
    ///
    /// Non-2xx responses surface as [`Error::Http`] tagged with this
    /// operation's id. Transport faults that never produced a response stay
    /// [`Error::Network`].
    pub async fn call(
        &self,
        payload: impl Into<Payload>,
        options: Option<RequestOptions>,
    ) -> Result<ApiResponse> {
        // Read configuration fresh for this call; the guard must not be held
        // across an await.
        let (descriptor, merged_options, middlewares, array_format, transport) = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            (
                OperationDescriptor {
                    base_url: state.base_url.clone(),
                    path: self.path.clone(),
                    method: self.method.clone(),
                    query_keys: self.query_keys.clone(),
                },
                state.default_options.merged_with(options.as_ref()),
                state.middlewares.clone(),
                state.array_format,
                Arc::clone(&state.transport),
            )
        };

        let (url, init) = assemble(&descriptor, payload.into(), &merged_options, array_format)?;

        tracing::debug!(
            operation = %self.id,
            method = %descriptor.method,
            url = %url,
            "Dispatching request"
        );

        let next = Next::new(&middlewares, transport.as_ref());
        match next.run(url, init).await {
            Ok(response) => Ok(response),
            Err(Error::Http(mut e)) => {
                e.operation = Some(self.id);
                Err(Error::Http(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Runs the pipeline and deserializes the response body into `T`.
    pub async fn call_as<T: serde::de::DeserializeOwned>(
        &self,
        payload: impl Into<Payload>,
        options: Option<RequestOptions>,
    ) -> Result<T> {
        self.call(payload, options).await?.data_as()
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query_keys", &self.query_keys)
            .field("id", &self.id)
            .finish()
    }
}
