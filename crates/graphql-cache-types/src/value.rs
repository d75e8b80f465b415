//! Field values stored in a [`Record`](crate::record::Record).
//!
//! A field is one of: a JSON scalar, a [`Reference`](FieldValue::Reference)
//! to another cache key, or a list of either (lists may nest). Records
//! never nest whole objects — a sub-object always shows up as a
//! `Reference`, never as an inline scalar object.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::cache_key::CacheKey;

/// A JSON scalar: null, bool, number, or string. Deliberately excludes
/// array/object so that a `Record` can't accidentally smuggle an
/// un-normalized sub-object past the type system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// Convert a `serde_json::Value`, rejecting arrays and objects.
    ///
    /// Returns `None` for `Value::Array`/`Value::Object`; callers that hit
    /// this on a response payload have a schema/codegen bug upstream, not a
    /// cache bug, so this is deliberately infallible-looking `Option` rather
    /// than a full `CacheError` variant of its own.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Scalar::Null),
            serde_json::Value::Bool(b) => Some(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Some(Scalar::Number(n)),
            serde_json::Value::String(s) => Some(Scalar::String(s)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Convert back to a `serde_json::Value`.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Bool(b) => serde_json::Value::Bool(b),
            Scalar::Number(n) => serde_json::Value::Number(n),
            Scalar::String(s) => serde_json::Value::String(s),
        }
    }
}

/// A value stored under a field key inside a [`Record`](crate::record::Record).
///
/// Adjacently tagged so a `Reference` and a `Scalar::String` holding the
/// same text never collide on the wire — the store's round-trip invariant
/// depends on the tag surviving (de)serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum FieldValue {
    Scalar(Scalar),
    Reference(CacheKey),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn null() -> Self {
        FieldValue::Scalar(Scalar::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Scalar(Scalar::Null))
    }

    /// If this value is a single reference, return it.
    pub fn as_reference(&self) -> Option<&CacheKey> {
        match self {
            FieldValue::Reference(key) => Some(key),
            _ => None,
        }
    }

    /// If this value is a list, return its elements.
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Build the serialized field key for a selection: `name` when the field
/// takes no identity-affecting arguments, `name(sortedArgsJSON)` otherwise.
///
/// Arguments are sorted by name before serialization so that two
/// selections issuing the same arguments in a different order land on the
/// same field key.
pub fn field_key(name: &str, arguments: &[(String, serde_json::Value)]) -> String {
    if arguments.is_empty() {
        return name.to_string();
    }

    let mut sorted = arguments.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let map: serde_json::Map<String, serde_json::Value> = sorted.into_iter().collect();
    let args_json = serde_json::Value::Object(map).to_string();
    format!("{name}({args_json})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_key_without_arguments_is_bare_name() {
        assert_eq!(field_key("name", &[]), "name");
    }

    #[test]
    fn field_key_sorts_arguments_for_stability() {
        let a = field_key(
            "hero",
            &[
                ("episode".to_string(), serde_json::json!("EMPIRE")),
                ("lang".to_string(), serde_json::json!("en")),
            ],
        );
        let b = field_key(
            "hero",
            &[
                ("lang".to_string(), serde_json::json!("en")),
                ("episode".to_string(), serde_json::json!("EMPIRE")),
            ],
        );
        assert_eq!(a, b);
        assert_eq!(a, r#"hero({"episode":"EMPIRE","lang":"en"})"#);
    }

    #[test]
    fn scalar_conversion_rejects_structured_json() {
        assert!(Scalar::from_json(serde_json::json!([1, 2])).is_none());
        assert!(Scalar::from_json(serde_json::json!({"a": 1})).is_none());
        assert_eq!(Scalar::from_json(serde_json::json!(null)), Some(Scalar::Null));
    }

    #[test]
    fn reference_and_scalar_string_round_trip_distinctly() {
        let reference = FieldValue::Reference(CacheKey::new("2001"));
        let scalar = FieldValue::Scalar(Scalar::String("2001".to_string()));

        let reference_json = serde_json::to_string(&reference).unwrap();
        let scalar_json = serde_json::to_string(&scalar).unwrap();
        assert_ne!(reference_json, scalar_json);

        let round_tripped: FieldValue = serde_json::from_str(&reference_json).unwrap();
        assert_eq!(round_tripped, reference);
    }
}
