//! Request assembly.
//!
//! The assembler takes an operation descriptor and a payload and produces the
//! final URL plus a transport-ready request configuration. A single payload
//! is split three ways: path placeholders consume their keys first, declared
//! query keys are extracted next, and whatever remains becomes the body.

use crate::{
    payload::Payload,
    query::{self, ArrayFormat},
    Error, Result,
};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Map;
use std::time::Duration;

/// Returns `true` for methods whose semantics send a request body.
pub(crate) fn send_body(method: &Method) -> bool {
    *method == Method::POST
        || *method == Method::PUT
        || *method == Method::PATCH
        || *method == Method::DELETE
}

/// Default and per-call request options.
///
/// Per-call options are merged over the client defaults: headers override
/// per name (case-insensitively), every other option wholesale.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers applied to the request.
    pub headers: HeaderMap,

    /// Per-request timeout handed to the transport.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Merges per-call overrides over these defaults.
    pub fn merged_with(&self, overrides: Option<&RequestOptions>) -> RequestOptions {
        let mut merged = self.clone();
        if let Some(overrides) = overrides {
            for (name, value) in &overrides.headers {
                merged.headers.insert(name.clone(), value.clone());
            }
            if overrides.timeout.is_some() {
                merged.timeout = overrides.timeout;
            }
        }
        merged
    }
}

/// A transport-ready request configuration. Built fresh per call and
/// discarded after the network call completes.
#[derive(Debug, Clone)]
pub struct RequestInit {
    /// The HTTP method.
    pub method: Method,
    /// The final header collection.
    pub headers: HeaderMap,
    /// The serialized body, if any.
    pub body: Option<String>,
    /// The per-request timeout, if any.
    pub timeout: Option<Duration>,
}

/// Immutable per-operation metadata used to build requests.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    /// The base URL prepended to the substituted path.
    pub base_url: String,
    /// The path template, with `{name}` placeholders.
    pub path: String,
    /// The HTTP method.
    pub method: Method,
    /// Payload keys serialized as query parameters for body-sending methods.
    pub query_keys: Vec<String>,
}

/// Substitutes each `{name}` placeholder, consuming the payload key so the
/// value never reappears in the query string or body.
fn substitute_path(template: &str, payload: &mut Payload) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| {
            Error::Configuration(format!("Unclosed placeholder in path template `{template}`"))
        })?;
        let name = &after[..end];

        let value = payload.take(name).ok_or_else(|| Error::MissingPathParam {
            name: name.to_string(),
            path: template.to_string(),
        })?;
        out.push_str(&query::encode(&query::scalar_string(&value)));

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Extracts the query parameter map from the remaining payload.
///
/// Body-sending methods pull exactly the declared query keys; all other
/// methods turn the entire remaining named payload into the query.
fn extract_query(
    method: &Method,
    payload: &mut Payload,
    query_keys: &[String],
) -> Map<String, serde_json::Value> {
    if send_body(method) {
        let mut query = Map::new();
        for key in query_keys {
            if let Some(value) = payload.take(key) {
                query.insert(key.clone(), value);
            }
        }
        query
    } else {
        std::mem::replace(payload, Payload::empty()).into_query_map()
    }
}

/// Serializes the body for body-sending methods.
///
/// A delete whose remaining payload is an empty object sends no body at all.
fn encode_body(method: &Method, payload: Payload) -> Result<Option<String>> {
    if !send_body(method) {
        return Ok(None);
    }

    let body = serde_json::to_string(&payload.into_body_value())
        .map_err(|e| Error::Serialization(e.to_string()))?;

    if *method == Method::DELETE && body == "{}" {
        return Ok(None);
    }

    Ok(Some(body))
}

/// Finalizes headers: merged options first, then JSON defaults for
/// `Content-Type` (only when a body is present) and `Accept` where the
/// caller set neither.
fn build_headers(mut headers: HeaderMap, has_body: bool) -> HeaderMap {
    if has_body && !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }
    if !headers.contains_key(header::ACCEPT) {
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    }
    headers
}

/// Builds the final URL and request configuration for one call.
///
/// Consumes a working copy of the payload; callers keep their original.
pub(crate) fn assemble(
    descriptor: &OperationDescriptor,
    mut payload: Payload,
    options: &RequestOptions,
    array_format: ArrayFormat,
) -> Result<(String, RequestInit)> {
    let path = substitute_path(&descriptor.path, &mut payload)?;
    let query = extract_query(&descriptor.method, &mut payload, &descriptor.query_keys);
    let body = encode_body(&descriptor.method, payload)?;
    let headers = build_headers(options.headers.clone(), body.is_some());

    let url = format!(
        "{}{}{}",
        descriptor.base_url,
        path,
        query::query_string(&query, array_format)
    );

    let init = RequestInit {
        method: descriptor.method.clone(),
        headers,
        body,
        timeout: options.timeout,
    };

    Ok((url, init))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(method: Method, path: &str, query_keys: &[&str]) -> OperationDescriptor {
        OperationDescriptor {
            base_url: "https://api.backend.dev".to_string(),
            path: path.to_string(),
            method,
            query_keys: query_keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn assemble_ok(
        descriptor: &OperationDescriptor,
        payload: serde_json::Value,
    ) -> (String, RequestInit) {
        assemble(
            descriptor,
            Payload::from(payload),
            &RequestOptions::new(),
            ArrayFormat::Repeated,
        )
        .unwrap()
    }

    #[test]
    fn test_get_consumes_path_keys_before_query() {
        let descriptor = descriptor(Method::GET, "/query/{a}/{b}", &[]);
        let (url, init) = assemble_ok(
            &descriptor,
            json!({ "a": 1, "b": "2", "scalar": "a", "list": ["b", "c"] }),
        );

        assert_eq!(
            url,
            "https://api.backend.dev/query/1/2?scalar=a&list=b&list=c"
        );
        assert_eq!(init.body, None);
    }

    #[test]
    fn test_body_method_with_declared_query_keys() {
        let descriptor = descriptor(Method::POST, "/bodyquery/{id}", &["scalar"]);
        let (url, init) = assemble_ok(
            &descriptor,
            json!({ "id": 1, "scalar": "a", "list": ["b", "c"] }),
        );

        assert_eq!(url, "https://api.backend.dev/bodyquery/1?scalar=a");
        assert_eq!(init.body.as_deref(), Some(r#"{"list":["b","c"]}"#));
    }

    #[test]
    fn test_declared_query_keys_ignored_for_get() {
        let descriptor = descriptor(Method::GET, "/query/{a}", &["scalar"]);
        let (url, init) = assemble_ok(&descriptor, json!({ "a": 1, "scalar": "a", "other": 2 }));

        // Everything remaining goes to the query for non-body methods.
        assert_eq!(url, "https://api.backend.dev/query/1?scalar=a&other=2");
        assert_eq!(init.body, None);
    }

    #[test]
    fn test_delete_suppresses_empty_body() {
        let descriptor = descriptor(Method::DELETE, "/body/{id}", &[]);
        let (url, init) = assemble_ok(&descriptor, json!({ "id": 1 }));

        assert_eq!(url, "https://api.backend.dev/body/1");
        assert_eq!(init.body, None);
        // No body, so no Content-Type default either.
        assert!(!init.headers.contains_key(header::CONTENT_TYPE));
    }

    #[test]
    fn test_delete_keeps_meaningful_body() {
        let descriptor = descriptor(Method::DELETE, "/body/{id}", &[]);
        let (_, init) = assemble_ok(&descriptor, json!({ "id": 1, "reason": "spam" }));

        assert_eq!(init.body.as_deref(), Some(r#"{"reason":"spam"}"#));
    }

    #[test]
    fn test_missing_path_param_is_an_error() {
        let descriptor = descriptor(Method::GET, "/query/{a}/{b}", &[]);
        let result = assemble(
            &descriptor,
            Payload::from(json!({ "a": 1 })),
            &RequestOptions::new(),
            ArrayFormat::Repeated,
        );

        match result {
            Err(Error::MissingPathParam { name, path }) => {
                assert_eq!(name, "b");
                assert_eq!(path, "/query/{a}/{b}");
            }
            other => panic!("Expected MissingPathParam, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_placeholder_is_a_configuration_error() {
        let descriptor = descriptor(Method::GET, "/query/{a", &[]);
        let result = assemble(
            &descriptor,
            Payload::from(json!({ "a": 1 })),
            &RequestOptions::new(),
            ArrayFormat::Repeated,
        );

        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_path_values_are_percent_encoded() {
        let descriptor = descriptor(Method::GET, "/users/{name}", &[]);
        let (url, _) = assemble_ok(&descriptor, json!({ "name": "a b" }));

        assert_eq!(url, "https://api.backend.dev/users/a%20b");
    }

    #[test]
    fn test_json_defaults_applied_when_body_present() {
        let descriptor = descriptor(Method::POST, "/body/{id}", &[]);
        let (_, init) = assemble_ok(&descriptor, json!({ "id": 1, "list": ["b"] }));

        assert_eq!(
            init.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(init.headers.get(header::ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn test_explicit_content_type_not_overridden() {
        let descriptor = descriptor(Method::POST, "/body/{id}", &[]);
        let options = RequestOptions::new()
            .header("Content-Type", "application/vnd.api+json")
            .unwrap();

        let (_, init) = assemble(
            &descriptor,
            Payload::from(json!({ "id": 1, "x": 1 })),
            &options,
            ArrayFormat::Repeated,
        )
        .unwrap();

        assert_eq!(
            init.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/vnd.api+json"
        );
    }

    #[test]
    fn test_array_body_sideband_feeds_path_and_query() {
        let sideband = json!({ "id": 9, "scalar": "a" }).as_object().unwrap().clone();
        let payload = Payload::array_with(vec![json!("b"), json!("c")], sideband);

        let descriptor = descriptor(Method::POST, "/bodyquery/{id}", &["scalar"]);
        let (url, init) = assemble(
            &descriptor,
            payload,
            &RequestOptions::new(),
            ArrayFormat::Repeated,
        )
        .unwrap();

        assert_eq!(url, "https://api.backend.dev/bodyquery/9?scalar=a");
        assert_eq!(init.body.as_deref(), Some(r#"["b","c"]"#));
    }

    #[test]
    fn test_options_merge_overrides_per_header_name() {
        let defaults = RequestOptions::new()
            .header("Authorization", "Bearer default")
            .unwrap()
            .header("X-Tenant", "acme")
            .unwrap();
        // Different case on purpose: header merge is case-insensitive.
        let overrides = RequestOptions::new()
            .header("authorization", "Bearer override")
            .unwrap();

        let merged = defaults.merged_with(Some(&overrides));

        assert_eq!(
            merged.headers.get("authorization").unwrap(),
            "Bearer override"
        );
        assert_eq!(merged.headers.get("x-tenant").unwrap(), "acme");
    }

    #[test]
    fn test_options_merge_timeout_wholesale() {
        let defaults = RequestOptions::new().timeout(Duration::from_secs(30));
        let overrides = RequestOptions::new().timeout(Duration::from_secs(5));

        let merged = defaults.merged_with(Some(&overrides));
        assert_eq!(merged.timeout, Some(Duration::from_secs(5)));

        let unchanged = defaults.merged_with(Some(&RequestOptions::new()));
        assert_eq!(unchanged.timeout, Some(Duration::from_secs(30)));
    }
}
