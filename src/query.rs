//! Explode-style query string serialization.
//!
//! Nested values (objects, arrays, scalars) are flattened into an ordered
//! sequence of `key=value` pairs. Object entries serialize in insertion
//! order and array elements in index order, so the same input always
//! produces the same query string.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

/// Characters escaped by `encodeURIComponent`: everything except
/// `A-Za-z0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// How array elements are keyed in the query string.
///
/// Both conventions exist in the wild; pick one per client and it is applied
/// consistently, never mixed within a single serialization.
///
/// # Examples
///
/// ```
/// use opfetch::query::{query_string, ArrayFormat};
/// use serde_json::json;
///
/// let params = json!({ "list": ["b", "c"] });
/// let params = params.as_object().unwrap();
///
/// assert_eq!(query_string(params, ArrayFormat::Repeated), "?list=b&list=c");
/// assert_eq!(query_string(params, ArrayFormat::Indexed), "?list[0]=b&list[1]=c");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayFormat {
    /// Scalar elements repeat the bare key (`key=v0&key=v1`); composite
    /// elements (objects or nested arrays) are index-qualified
    /// (`key[0][name]=v`).
    #[default]
    Repeated,

    /// Every element is index-qualified (`key[0]=v0&key[1]=v1`).
    Indexed,
}

/// Percent-encodes a string for use as a query key or value.
pub(crate) fn encode(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Returns the plain string form of a terminal scalar.
///
/// Strings are used verbatim (no surrounding quotes); numbers and booleans
/// use their JSON display form.
pub(crate) fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Recursively flattens `value` under `prefix`, appending `key=value` pairs
/// to `out`.
///
/// `Null` contributes nothing at any level. A terminal scalar with an empty
/// prefix emits the bare encoded value (the top-level scalar and
/// array-of-scalars case).
pub fn explode(out: &mut Vec<String>, prefix: &str, value: &Value, format: ArrayFormat) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let index_qualified =
                    format == ArrayFormat::Indexed || item.is_object() || item.is_array();
                let indexed;
                let key = if index_qualified {
                    indexed = format!("{prefix}[{index}]");
                    indexed.as_str()
                } else {
                    prefix
                };
                explode(out, key, item, format);
            }
        }
        Value::Object(entries) => {
            for (key, entry) in entries {
                let child = if prefix.is_empty() {
                    encode(key)
                } else {
                    format!("{prefix}[{}]", encode(key))
                };
                explode(out, &child, entry, format);
            }
        }
        scalar => {
            let encoded = encode(&scalar_string(scalar));
            if prefix.is_empty() {
                out.push(encoded);
            } else {
                out.push(format!("{prefix}={encoded}"));
            }
        }
    }
}

/// Serializes a parameter map into a `?`-prefixed query string.
///
/// Returns the empty string when no pairs were emitted.
pub fn query_string(params: &Map<String, Value>, format: ArrayFormat) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        explode(&mut pairs, &encode(key), value, format);
    }

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exploded(value: Value, format: ArrayFormat) -> Vec<String> {
        let mut out = Vec::new();
        explode(&mut out, "", &value, format);
        out
    }

    #[test]
    fn test_null_contributes_nothing() {
        assert!(exploded(Value::Null, ArrayFormat::Repeated).is_empty());
        assert!(exploded(json!({ "a": null }), ArrayFormat::Repeated).is_empty());
    }

    #[test]
    fn test_top_level_scalar() {
        assert_eq!(
            exploded(json!("someString"), ArrayFormat::Repeated),
            vec!["someString"]
        );
    }

    #[test]
    fn test_flat_object() {
        assert_eq!(
            exploded(json!({ "query": "queryValue" }), ArrayFormat::Repeated),
            vec!["query=queryValue"]
        );
        assert_eq!(
            exploded(json!({ "query": 9 }), ArrayFormat::Repeated),
            vec!["query=9"]
        );
    }

    #[test]
    fn test_nested_objects() {
        let value = json!({
            "level1": { "level1a": "a", "level1b": "b" },
            "level2": {
                "level2a": { "level2sigma": "off limits" },
                "level2b": "b",
            },
        });

        assert_eq!(
            exploded(value, ArrayFormat::Repeated),
            vec![
                "level1[level1a]=a",
                "level1[level1b]=b",
                "level2[level2a][level2sigma]=off%20limits",
                "level2[level2b]=b",
            ]
        );
    }

    #[test]
    fn test_scalar_array_repeats_bare_key() {
        assert_eq!(
            exploded(
                json!({ "options": ["staySignedIn", "darkMode"] }),
                ArrayFormat::Repeated
            ),
            vec!["options=staySignedIn", "options=darkMode"]
        );
    }

    #[test]
    fn test_scalar_array_under_nested_key() {
        assert_eq!(
            exploded(
                json!({ "user1": { "options": ["staySignedIn", "darkMode"] } }),
                ArrayFormat::Repeated
            ),
            vec!["user1[options]=staySignedIn", "user1[options]=darkMode"]
        );
    }

    #[test]
    fn test_top_level_array_of_scalars() {
        assert_eq!(
            exploded(json!(["isFirstView", "isRedirect"]), ArrayFormat::Repeated),
            vec!["isFirstView", "isRedirect"]
        );
    }

    #[test]
    fn test_array_of_objects_is_index_qualified() {
        assert_eq!(
            exploded(
                json!({ "list": [{ "name": "Turtle" }, { "name": "Mouse" }] }),
                ArrayFormat::Repeated
            ),
            vec!["list[0][name]=Turtle", "list[1][name]=Mouse"]
        );
    }

    #[test]
    fn test_nested_arrays() {
        let value = json!({
            "parts": [["red", 200], ["green", 25], ["blue", 170]],
        });

        assert_eq!(
            exploded(value, ArrayFormat::Repeated),
            vec![
                "parts[0]=red",
                "parts[0]=200",
                "parts[1]=green",
                "parts[1]=25",
                "parts[2]=blue",
                "parts[2]=170",
            ]
        );
    }

    #[test]
    fn test_indexed_format_qualifies_scalars() {
        assert_eq!(
            exploded(json!({ "list": ["b", "c"] }), ArrayFormat::Indexed),
            vec!["list[0]=b", "list[1]=c"]
        );
    }

    #[test]
    fn test_query_string_joins_and_prefixes() {
        let params = json!({ "scalar": "a", "list": ["b", "c"] });
        let params = params.as_object().unwrap();

        assert_eq!(
            query_string(params, ArrayFormat::Repeated),
            "?scalar=a&list=b&list=c"
        );
    }

    #[test]
    fn test_query_string_empty() {
        assert_eq!(query_string(&Map::new(), ArrayFormat::Repeated), "");

        let only_null = json!({ "a": null });
        assert_eq!(
            query_string(only_null.as_object().unwrap(), ArrayFormat::Repeated),
            ""
        );
    }

    #[test]
    fn test_key_and_value_encoding() {
        assert_eq!(
            exploded(json!({ "a key": "a value" }), ArrayFormat::Repeated),
            vec!["a%20key=a%20value"]
        );
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let value = json!({
            "scalar": "a",
            "list": ["b", "c"],
            "nested": { "x": 1, "y": [true, false] },
        });

        let first = exploded(value.clone(), ArrayFormat::Repeated);
        let second = exploded(value, ArrayFormat::Repeated);
        assert_eq!(first, second);
    }
}
