//! Request payload model.
//!
//! A payload is the caller-supplied bag of values that the request assembler
//! splits into path parameters, query parameters, and body. The assembler
//! always works on its own copy; the caller's value is never mutated.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// A request payload, tagged by shape.
///
/// The interesting variant is [`Payload::ArrayBody`]: a body that is itself a
/// JSON array, carried alongside named sideband fields that are consumed by
/// path substitution and query extraction instead of being serialized into
/// the array.
///
/// # Examples
///
/// ```
/// use opfetch::Payload;
/// use serde_json::json;
///
/// // A plain keyed payload.
/// let keyed = Payload::from(json!({ "id": 1, "name": "Turtle" }));
///
/// // An array body with a sideband path parameter.
/// let array = Payload::array_with(
///     vec![json!({ "item": 2 })],
///     json!({ "id": 3 }).as_object().unwrap().clone(),
/// );
/// # let _ = (keyed, array);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single scalar value used verbatim as the body.
    Scalar(Value),

    /// A keyed mapping; entries are consumed by path substitution and query
    /// extraction, and whatever remains becomes the body.
    Keyed(Map<String, Value>),

    /// An array-shaped body plus named sideband fields.
    ArrayBody {
        /// The array elements, serialized as the JSON body.
        items: Vec<Value>,
        /// Named fields available to path substitution and query extraction.
        /// Leftover sideband fields are dropped when the body is serialized.
        sideband: Map<String, Value>,
    },
}

impl Payload {
    /// Creates an empty keyed payload.
    pub fn empty() -> Self {
        Payload::Keyed(Map::new())
    }

    /// Creates an array body with sideband fields.
    pub fn array_with(items: Vec<Value>, sideband: Map<String, Value>) -> Self {
        Payload::ArrayBody { items, sideband }
    }

    /// Converts any serializable value into a payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the value cannot be represented
    /// as JSON.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self::from(value))
    }

    /// Removes and returns the named field, if present.
    ///
    /// Looks in the keyed map or the array sideband; a scalar payload has no
    /// named fields.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        match self {
            Payload::Scalar(_) => None,
            Payload::Keyed(map) => map.shift_remove(key),
            Payload::ArrayBody { sideband, .. } => sideband.shift_remove(key),
        }
    }

    /// Consumes the remaining named fields as a query parameter map.
    ///
    /// Used for methods that send no body: every named field left after path
    /// substitution becomes a query parameter. Array items and scalar values
    /// have no parameter names and contribute nothing.
    pub(crate) fn into_query_map(self) -> Map<String, Value> {
        match self {
            Payload::Scalar(_) => Map::new(),
            Payload::Keyed(map) => map,
            Payload::ArrayBody { sideband, .. } => sideband,
        }
    }

    /// Consumes the payload into the JSON value serialized as the body.
    ///
    /// Leftover sideband fields on an array body are dropped, matching how a
    /// JSON array serializes.
    pub(crate) fn into_body_value(self) -> Value {
        match self {
            Payload::Scalar(value) => value,
            Payload::Keyed(map) => Value::Object(map),
            Payload::ArrayBody { items, .. } => Value::Array(items),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Payload::Keyed(map),
            Value::Array(items) => Payload::ArrayBody {
                items,
                sideband: Map::new(),
            },
            scalar => Payload::Scalar(scalar),
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload::Keyed(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_body_with_sideband_params() {
        let sideband = json!({ "param": 3 }).as_object().unwrap().clone();
        let mut payload = Payload::array_with(vec![json!({ "item": 2 })], sideband);

        assert_eq!(payload.take("param"), Some(json!(3)));
        assert_eq!(payload.take("param"), None);
        assert_eq!(payload.into_body_value(), json!([{ "item": 2 }]));
    }

    #[test]
    fn test_from_value_shapes() {
        assert!(matches!(Payload::from(json!({ "a": 1 })), Payload::Keyed(_)));
        assert!(matches!(
            Payload::from(json!(["a", "b"])),
            Payload::ArrayBody { .. }
        ));
        assert!(matches!(Payload::from(json!(42)), Payload::Scalar(_)));
    }

    #[test]
    fn test_take_removes_key_from_keyed() {
        let mut payload = Payload::from(json!({ "id": 1, "name": "x" }));

        assert_eq!(payload.take("id"), Some(json!(1)));
        assert_eq!(payload.into_body_value(), json!({ "name": "x" }));
    }

    #[test]
    fn test_scalar_has_no_named_fields() {
        let mut payload = Payload::from(json!("lone"));

        assert_eq!(payload.take("anything"), None);
        assert!(payload.clone().into_query_map().is_empty());
        assert_eq!(payload.into_body_value(), json!("lone"));
    }

    #[test]
    fn test_leftover_sideband_dropped_from_body() {
        let sideband = json!({ "extra": true }).as_object().unwrap().clone();
        let payload = Payload::array_with(vec![json!("a")], sideband);

        assert_eq!(payload.into_body_value(), json!(["a"]));
    }

    #[test]
    fn test_from_serialize() {
        #[derive(serde::Serialize)]
        struct Params {
            id: u32,
        }

        let payload = Payload::from_serialize(&Params { id: 7 }).unwrap();
        assert_eq!(payload, Payload::from(json!({ "id": 7 })));
    }
}
