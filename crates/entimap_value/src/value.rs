//! Tagged-union value type of the document store.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::key::Key;
use crate::timestamp::Timestamp;

/// A native store value.
///
/// This type represents any value the connected document store can hold in
/// one entity property: scalars, byte strings, timestamps, key references,
/// lists, and nested entities. Model objects never hold `Value`s directly;
/// converters produce and consume them at the mapping boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (full i64 range).
    Integer(i64),
    /// Double-precision floating point.
    Double(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Timestamp with microsecond precision.
    Timestamp(Timestamp),
    /// Reference to another entity's key.
    KeyRef(Key),
    /// List of values.
    List(Vec<Value>),
    /// Nested entity (stored name to value mapping).
    Entity(Entity),
}

/// The kind of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Null value.
    Null,
    /// Boolean value.
    Bool,
    /// Signed integer.
    Integer,
    /// Double-precision floating point.
    Double,
    /// Text string.
    Text,
    /// Byte string.
    Bytes,
    /// Timestamp.
    Timestamp,
    /// Key reference.
    KeyRef,
    /// List of values.
    List,
    /// Nested entity.
    Entity,
}

impl ValueKind {
    /// Whether values of this kind may have their indexing disabled.
    ///
    /// List values always keep their default indexing behavior; every other
    /// kind accepts an exclusion flag.
    pub const fn supports_index_exclusion(self) -> bool {
        !matches!(self, ValueKind::List)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Double => "double",
            ValueKind::Text => "text",
            ValueKind::Bytes => "bytes",
            ValueKind::Timestamp => "timestamp",
            ValueKind::KeyRef => "key",
            ValueKind::List => "list",
            ValueKind::Entity => "entity",
        };
        write!(f, "{}", name)
    }
}

impl Value {
    /// Get the kind of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Double(_) => ValueKind::Double,
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::KeyRef(_) => ValueKind::KeyRef,
            Value::List(_) => ValueKind::List,
            Value::Entity(_) => ValueKind::Entity,
        }
    }

    /// Check if this value is null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a double, if it is one.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as bytes, if it is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get this value as a timestamp, if it is one.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Get this value as a key reference, if it is one.
    pub fn as_key(&self) -> Option<&Key> {
        match self {
            Value::KeyRef(k) => Some(k),
            _ => None,
        }
    }

    /// Get this value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get this value as a nested entity, if it is one.
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Key> for Value {
    fn from(k: Key) -> Self {
        Value::KeyRef(k)
    }
}

impl From<Entity> for Value {
    fn from(e: Entity) -> Self {
        Value::Entity(e)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_kinds() {
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(Value::Integer(1).kind(), ValueKind::Integer);
        assert_eq!(Value::Double(1.5).kind(), ValueKind::Double);
        assert_eq!(Value::Text("x".to_string()).kind(), ValueKind::Text);
        assert_eq!(Value::Bytes(vec![0]).kind(), ValueKind::Bytes);
        assert_eq!(
            Value::Timestamp(Timestamp::from_micros(0)).kind(),
            ValueKind::Timestamp
        );
        assert_eq!(Value::List(vec![]).kind(), ValueKind::List);
    }

    #[test]
    fn value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());

        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_bool(), None);

        assert_eq!(Value::Integer(42).as_integer(), Some(42));
        assert_eq!(Value::Text("42".to_string()).as_integer(), None);

        assert_eq!(Value::Double(2.5).as_double(), Some(2.5));
        assert_eq!(Value::Text("hello".to_string()).as_text(), Some("hello"));
        assert_eq!(Value::Bytes(vec![1, 2, 3]).as_bytes(), Some(&[1, 2, 3][..]));

        let ts = Timestamp::from_micros(1_000_000);
        assert_eq!(Value::Timestamp(ts).as_timestamp(), Some(ts));

        let list = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(list.as_list().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn only_lists_refuse_index_exclusion() {
        assert!(!ValueKind::List.supports_index_exclusion());
        assert!(ValueKind::Null.supports_index_exclusion());
        assert!(ValueKind::Text.supports_index_exclusion());
        assert!(ValueKind::Entity.supports_index_exclusion());
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i64), Value::Integer(42));
        assert_eq!(Value::from(42i32), Value::Integer(42));
        assert_eq!(Value::from(42u32), Value::Integer(42));
        assert_eq!(Value::from(2.5f64), Value::Double(2.5));
        assert_eq!(Value::from("hello"), Value::Text("hello".to_string()));
        assert_eq!(Value::from(vec![1u8, 2, 3]), Value::Bytes(vec![1, 2, 3]));
        assert_eq!(
            Value::from(vec!["a", "b"]),
            Value::List(vec![
                Value::Text("a".to_string()),
                Value::Text("b".to_string())
            ])
        );
        assert_eq!(Value::from(()), Value::Null);
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(ValueKind::Text.to_string(), "text");
        assert_eq!(ValueKind::KeyRef.to_string(), "key");
        assert_eq!(ValueKind::Entity.to_string(), "entity");
    }

    #[test]
    fn serializes_to_json() {
        let value = Value::List(vec![Value::Integer(1), Value::Text("a".to_string())]);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
