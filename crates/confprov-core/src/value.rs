//! Document value types
//!
//! A parsed configuration document is a [`Mapping`] whose values are
//! scalars (string, integer, float, bool, null), sequences, or nested
//! mappings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// String-keyed mapping that keeps keys in source order
pub type Mapping = IndexMap<String, Value>;

/// A node of a parsed configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Sequence of values
    Sequence(Vec<Value>),
    /// Mapping of string keys to values
    Mapping(Mapping),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    /// Check if this value is a mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    /// Check if this value is neither a sequence nor a mapping
    pub fn is_scalar(&self) -> bool {
        !self.is_sequence() && !self.is_mapping()
    }

    /// Get as boolean if this is a Bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as str if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as slice if this is a Sequence
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Get as mapping if this is a Mapping
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a direct child key of a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Returns the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Deep merge `other` into this value.
    ///
    /// - Mappings: merged key by key, recursing into colliding mappings
    /// - Any other collision: `other` wins (sequences are replaced, not
    ///   concatenated; a null in `other` is kept as null)
    /// - Keys present on one side only pass through unchanged
    pub fn merge(&mut self, other: Value) {
        match (self, other) {
            (Value::Mapping(base), Value::Mapping(overlay)) => merge_mappings(base, overlay),
            (this, other) => {
                *this = other;
            }
        }
    }

    /// Create a merged value from two values (non-mutating)
    pub fn merged(mut self, other: Value) -> Value {
        self.merge(other);
        self
    }
}

/// Deep merge `overlay` into `base` following [`Value::merge`] rules
pub fn merge_mappings(base: &mut Mapping, overlay: Mapping) {
    for (key, overlay_value) in overlay {
        match base.get_mut(&key) {
            Some(base_value) => base_value.merge(overlay_value),
            None => {
                base.insert(key, overlay_value);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Sequence(seq) => {
                write!(f, "[")?;
                for (i, v) in seq.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Mapping(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mapping(entries: Vec<(&str, Value)>) -> Value {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_value_type_checks() {
        assert!(Value::Null.is_null());
        assert!(Value::Null.is_scalar());
        assert!(Value::Bool(true).is_scalar());
        assert!(Value::String("hello".into()).is_scalar());
        assert!(Value::Sequence(vec![]).is_sequence());
        assert!(!Value::Sequence(vec![]).is_scalar());
        assert!(Value::Mapping(Mapping::new()).is_mapping());
        assert!(!Value::Mapping(Mapping::new()).is_scalar());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_i64(), Some(42));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::from(vec!["a", "b"]).as_sequence().map(|s| s.len()), Some(2));
        assert_eq!(Value::Integer(1).as_mapping(), None);
    }

    #[test]
    fn test_get_child() {
        let value = mapping(vec![("name", "alpha".into())]);
        assert_eq!(value.get("name").and_then(Value::as_str), Some("alpha"));
        assert!(value.get("missing").is_none());
        assert!(Value::from("scalar").get("name").is_none());
    }

    #[test]
    fn test_merge_scalars() {
        let mut base = Value::String("base".into());
        base.merge(Value::String("overlay".into()));
        assert_eq!(base.as_str(), Some("overlay"));
    }

    #[test]
    fn test_merge_deep() {
        let base = mapping(vec![(
            "app",
            mapping(vec![("name", "alpha".into()), ("port", "1111".into())]),
        )]);
        let overlay = mapping(vec![(
            "app",
            mapping(vec![("port", "2222".into()), ("env", "prod".into())]),
        )]);

        let merged = base.merged(overlay);

        assert_eq!(
            merged,
            mapping(vec![(
                "app",
                mapping(vec![
                    ("name", "alpha".into()),
                    ("port", "2222".into()),
                    ("env", "prod".into()),
                ]),
            )])
        );
    }

    #[test]
    fn test_merge_null_overrides() {
        let mut base = mapping(vec![("feature", "on".into()), ("keep", "yes".into())]);
        base.merge(mapping(vec![("feature", Value::Null)]));

        assert_eq!(base.get("feature"), Some(&Value::Null));
        assert_eq!(base.get("keep").and_then(Value::as_str), Some("yes"));
    }

    #[test]
    fn test_merge_sequence_replaces() {
        let mut base = mapping(vec![("servers", vec!["a", "b"].into())]);
        base.merge(mapping(vec![("servers", vec!["c"].into())]));

        let servers = base.get("servers").and_then(Value::as_sequence).unwrap();
        assert_eq!(servers, &[Value::from("c")]);
    }

    #[test]
    fn test_merge_type_mismatch() {
        let mut base = mapping(vec![("database", mapping(vec![("host", "localhost".into())]))]);
        base.merge(mapping(vec![("database", "connection-string".into())]));
        assert_eq!(
            base.get("database").and_then(Value::as_str),
            Some("connection-string")
        );

        // A mapping arriving later replaces a scalar outright
        base.merge(mapping(vec![("database", mapping(vec![("port", 5432i64.into())]))]));
        assert_eq!(
            base.get("database"),
            Some(&mapping(vec![("port", Value::Integer(5432))]))
        );
    }

    #[test]
    fn test_display() {
        let value = mapping(vec![("a", 1i64.into()), ("b", vec![true, false].into())]);
        assert_eq!(value.to_string(), "{a: 1, b: [true, false]}");
    }
}
