//! Converters between host field types and native store values.
//!
//! A [`ValueConverter`] translates one field's worth of data in both
//! directions. The engine looks converters up by the field's declared Rust
//! type through [`converter_for`]; descriptors may override the lookup with a
//! custom converter instance per field.
//!
//! Null handling is uniform and lives in the trait's provided methods:
//! [`ValueConverter::to_native`] turns an absent host value into
//! [`Value::Null`] and [`ValueConverter::to_host`] turns a stored null back
//! into absence. Implementations only ever see present, non-null data.

mod collection;
mod scalar;
mod time;

pub use collection::{
    ListConverter, SetContainer, SetConverter, BOOL_HASH_SET, BOOL_LIST, BOOL_TREE_SET,
    DOUBLE_LIST, INTEGER_HASH_SET, INTEGER_LIST, INTEGER_TREE_SET, KEY_HASH_SET, KEY_LIST,
    KEY_TREE_SET, TEXT_HASH_SET, TEXT_LIST, TEXT_TREE_SET,
};
pub use scalar::{
    BoolConverter, BytesConverter, DoubleConverter, FloatConverter, Int16Converter,
    Int32Converter, IntegerConverter, KeyConverter, TextConverter, BOOL, BYTES, DOUBLE, FLOAT,
    INT16, INT32, INTEGER, KEY, TEXT,
};
pub use time::{
    DateTimeLocalConverter, DateTimeUtcConverter, TimestampConverter, DATETIME_LOCAL,
    DATETIME_UTC, TIMESTAMP,
};

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Local, Utc};
use entimap_value::{Key, KeyId, Timestamp, Value, ValueKind};

use crate::error::{ConversionError, ConversionResult};

/// Bidirectional translation between one host type and one native value kind.
///
/// Implementations are stateless and shared. The built-in converters are
/// `'static` singletons; custom converters are held behind an `Arc` in the
/// field descriptor that registered them.
pub trait ValueConverter: Send + Sync {
    /// The native kind this converter produces and accepts.
    fn native_kind(&self) -> ValueKind;

    /// The Rust type this converter reads from and writes to.
    fn host_type(&self) -> &'static str;

    /// Translates a present host value into a native value.
    ///
    /// `host` is always the type named by [`Self::host_type`]; anything else
    /// fails with [`ConversionError::HostType`].
    fn encode(&self, host: &dyn Any) -> ConversionResult<Value>;

    /// Translates a present, non-null native value into a host value.
    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>>;

    /// Translates an optional host value, mapping absence to null.
    fn to_native(&self, host: Option<&dyn Any>) -> ConversionResult<Value> {
        match host {
            Some(host) => self.encode(host),
            None => Ok(Value::Null),
        }
    }

    /// Translates a native value, mapping null to absence.
    fn to_host(&self, native: &Value) -> ConversionResult<Option<Box<dyn Any>>> {
        if native.is_null() {
            Ok(None)
        } else {
            self.decode(native).map(Some)
        }
    }
}

/// Downcasts an erased host value to a concrete reference.
///
/// Converter implementations use this at the top of `encode`; the failure
/// names the type the converter was expecting.
pub fn downcast_host<T: 'static>(host: &dyn Any) -> ConversionResult<&T> {
    host.downcast_ref::<T>()
        .ok_or_else(|| ConversionError::host_type(std::any::type_name::<T>()))
}

/// The shape of an entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// A signed 64-bit numeric identifier. Eligible for store allocation.
    Numeric,
    /// A text identifier. Always caller-assigned.
    Text,
}

/// A host type usable as an entity identifier.
///
/// Implemented for `i64` and `String` out of the box. Newtype wrappers
/// around either shape implement this trait to participate directly, without
/// a converter:
///
/// ```
/// use entimap_core::convert::{IdentifierValue, IdKind};
/// use entimap_core::error::ConversionResult;
/// use entimap_value::KeyId;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct OrderId(i64);
///
/// impl IdentifierValue for OrderId {
///     const KIND: IdKind = IdKind::Numeric;
///
///     fn from_key_id(id: &KeyId) -> ConversionResult<Self> {
///         i64::from_key_id(id).map(OrderId)
///     }
///
///     fn to_key_id(&self) -> KeyId {
///         self.0.to_key_id()
///     }
/// }
/// ```
pub trait IdentifierValue: Sized + Send + 'static {
    /// Whether identifiers of this type are numeric or text.
    const KIND: IdKind;

    /// Reads this identifier out of a key id component.
    fn from_key_id(id: &KeyId) -> ConversionResult<Self>;

    /// Writes this identifier into a key id component.
    fn to_key_id(&self) -> KeyId;
}

impl IdentifierValue for i64 {
    const KIND: IdKind = IdKind::Numeric;

    fn from_key_id(id: &KeyId) -> ConversionResult<Self> {
        id.as_numeric()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Integer, ValueKind::Text))
    }

    fn to_key_id(&self) -> KeyId {
        KeyId::Numeric(*self)
    }
}

impl IdentifierValue for String {
    const KIND: IdKind = IdKind::Text;

    fn from_key_id(id: &KeyId) -> ConversionResult<Self> {
        id.as_text()
            .map(str::to_owned)
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::Text, ValueKind::Integer))
    }

    fn to_key_id(&self) -> KeyId {
        KeyId::Text(self.clone())
    }
}

/// Looks up the built-in converter for a host type.
///
/// Returns `None` for types without a built-in mapping; metadata resolution
/// turns that into an unresolved type error unless the field registered a
/// custom converter.
pub fn converter_for(type_id: TypeId) -> Option<&'static dyn ValueConverter> {
    if type_id == TypeId::of::<String>() {
        return Some(&TEXT);
    }
    if type_id == TypeId::of::<i64>() {
        return Some(&INTEGER);
    }
    if type_id == TypeId::of::<i32>() {
        return Some(&INT32);
    }
    if type_id == TypeId::of::<i16>() {
        return Some(&INT16);
    }
    if type_id == TypeId::of::<bool>() {
        return Some(&BOOL);
    }
    if type_id == TypeId::of::<f64>() {
        return Some(&DOUBLE);
    }
    if type_id == TypeId::of::<f32>() {
        return Some(&FLOAT);
    }
    if type_id == TypeId::of::<Vec<u8>>() {
        return Some(&BYTES);
    }
    if type_id == TypeId::of::<Key>() {
        return Some(&KEY);
    }
    if type_id == TypeId::of::<Timestamp>() {
        return Some(&TIMESTAMP);
    }
    if type_id == TypeId::of::<DateTime<Utc>>() {
        return Some(&DATETIME_UTC);
    }
    if type_id == TypeId::of::<DateTime<Local>>() {
        return Some(&DATETIME_LOCAL);
    }
    if type_id == TypeId::of::<Vec<String>>() {
        return Some(&TEXT_LIST);
    }
    if type_id == TypeId::of::<Vec<i64>>() {
        return Some(&INTEGER_LIST);
    }
    if type_id == TypeId::of::<Vec<bool>>() {
        return Some(&BOOL_LIST);
    }
    if type_id == TypeId::of::<Vec<f64>>() {
        return Some(&DOUBLE_LIST);
    }
    if type_id == TypeId::of::<Vec<Key>>() {
        return Some(&KEY_LIST);
    }
    if type_id == TypeId::of::<HashSet<String>>() {
        return Some(&TEXT_HASH_SET);
    }
    if type_id == TypeId::of::<HashSet<i64>>() {
        return Some(&INTEGER_HASH_SET);
    }
    if type_id == TypeId::of::<HashSet<bool>>() {
        return Some(&BOOL_HASH_SET);
    }
    if type_id == TypeId::of::<HashSet<Key>>() {
        return Some(&KEY_HASH_SET);
    }
    if type_id == TypeId::of::<BTreeSet<String>>() {
        return Some(&TEXT_TREE_SET);
    }
    if type_id == TypeId::of::<BTreeSet<i64>>() {
        return Some(&INTEGER_TREE_SET);
    }
    if type_id == TypeId::of::<BTreeSet<bool>>() {
        return Some(&BOOL_TREE_SET);
    }
    if type_id == TypeId::of::<BTreeSet<Key>>() {
        return Some(&KEY_TREE_SET);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_covers_scalars_and_collections() {
        assert!(converter_for(TypeId::of::<String>()).is_some());
        assert!(converter_for(TypeId::of::<i64>()).is_some());
        assert!(converter_for(TypeId::of::<Vec<u8>>()).is_some());
        assert!(converter_for(TypeId::of::<Vec<String>>()).is_some());
        assert!(converter_for(TypeId::of::<HashSet<i64>>()).is_some());
        assert!(converter_for(TypeId::of::<BTreeSet<Key>>()).is_some());
        assert!(converter_for(TypeId::of::<DateTime<Utc>>()).is_some());
    }

    #[test]
    fn lookup_rejects_unmapped_types() {
        struct Opaque;
        assert!(converter_for(TypeId::of::<Opaque>()).is_none());
        assert!(converter_for(TypeId::of::<u64>()).is_none());
        assert!(converter_for(TypeId::of::<Vec<Vec<String>>>()).is_none());
    }

    #[test]
    fn bytes_win_over_the_generic_list_shape() {
        let converter = converter_for(TypeId::of::<Vec<u8>>()).unwrap();
        assert_eq!(converter.native_kind(), ValueKind::Bytes);
    }

    #[test]
    fn null_round_trip_is_uniform() {
        let converter = converter_for(TypeId::of::<String>()).unwrap();
        assert_eq!(converter.to_native(None).unwrap(), Value::Null);
        assert!(converter.to_host(&Value::Null).unwrap().is_none());
    }

    #[test]
    fn identifier_values_convert_both_ways() {
        let id = 42i64.to_key_id();
        assert_eq!(i64::from_key_id(&id).unwrap(), 42);

        let id = "alice".to_string().to_key_id();
        assert_eq!(String::from_key_id(&id).unwrap(), "alice");

        let err = i64::from_key_id(&KeyId::Text("alice".into())).unwrap_err();
        assert_eq!(err.to_string(), "expecting integer, but found text");
    }
}
