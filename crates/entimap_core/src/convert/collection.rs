//! Built-in converters for list and set host types.
//!
//! Both container shapes share the native list representation; sets simply
//! come back deduplicated in the container's own order. Element support is
//! narrower than the full value model: lists hold text, integers, booleans,
//! doubles, and key references, and sets drop doubles because the host set
//! types need equality.

use std::any::{type_name, Any};
use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;

use entimap_value::{Key, Value, ValueKind};

use crate::convert::scalar::{BOOL, DOUBLE, INTEGER, KEY, TEXT};
use crate::convert::{downcast_host, ValueConverter};
use crate::error::{ConversionError, ConversionResult};

fn supported_list_element(kind: ValueKind) -> bool {
    matches!(
        kind,
        ValueKind::Text
            | ValueKind::Integer
            | ValueKind::Bool
            | ValueKind::Double
            | ValueKind::KeyRef
    )
}

fn supported_set_element(kind: ValueKind) -> bool {
    matches!(
        kind,
        ValueKind::Text | ValueKind::Integer | ValueKind::Bool | ValueKind::KeyRef
    )
}

/// Converter between `Vec<T>` and list values.
///
/// Delegates per element to a scalar converter. Decoding rejects element
/// kinds outside the supported subset before the element converter runs, so
/// a list holding a nested entity reports the unsupported kind rather than
/// a plain kind mismatch.
pub struct ListConverter<T> {
    element: &'static dyn ValueConverter,
    marker: PhantomData<fn() -> T>,
}

impl<T> ListConverter<T> {
    /// Creates a list converter around an element converter.
    pub const fn new(element: &'static dyn ValueConverter) -> Self {
        Self {
            element,
            marker: PhantomData,
        }
    }
}

impl<T: 'static> ValueConverter for ListConverter<T> {
    fn native_kind(&self) -> ValueKind {
        ValueKind::List
    }

    fn host_type(&self) -> &'static str {
        type_name::<Vec<T>>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let items = downcast_host::<Vec<T>>(host)?;
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.element.encode(item as &dyn Any)?);
        }
        Ok(Value::List(values))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let values = native
            .as_list()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::List, native.kind()))?;
        let mut items = Vec::with_capacity(values.len());
        for value in values {
            if !supported_list_element(value.kind()) {
                return Err(ConversionError::unsupported_element(value.kind(), "list"));
            }
            let boxed = self.element.decode(value)?;
            let item = boxed
                .downcast::<T>()
                .map_err(|_| ConversionError::host_type(type_name::<T>()))?;
            items.push(*item);
        }
        Ok(Box::new(items))
    }
}

/// A host set shape usable behind a [`SetConverter`].
pub trait SetContainer: 'static {
    /// The element type held by the container.
    type Elem: 'static;

    /// An empty container.
    fn empty() -> Self;

    /// Inserts one element.
    fn add(&mut self, elem: Self::Elem);

    /// Iterates the elements in the container's natural order.
    fn elems(&self) -> Box<dyn Iterator<Item = &Self::Elem> + '_>;
}

impl<T: Eq + Hash + 'static> SetContainer for HashSet<T> {
    type Elem = T;

    fn empty() -> Self {
        HashSet::new()
    }

    fn add(&mut self, elem: T) {
        self.insert(elem);
    }

    fn elems(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}

impl<T: Ord + 'static> SetContainer for BTreeSet<T> {
    type Elem = T;

    fn empty() -> Self {
        BTreeSet::new()
    }

    fn add(&mut self, elem: T) {
        self.insert(elem);
    }

    fn elems(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}

/// Converter between a set container and list values.
pub struct SetConverter<S> {
    element: &'static dyn ValueConverter,
    marker: PhantomData<fn() -> S>,
}

impl<S> SetConverter<S> {
    /// Creates a set converter around an element converter.
    pub const fn new(element: &'static dyn ValueConverter) -> Self {
        Self {
            element,
            marker: PhantomData,
        }
    }
}

impl<S: SetContainer> ValueConverter for SetConverter<S> {
    fn native_kind(&self) -> ValueKind {
        ValueKind::List
    }

    fn host_type(&self) -> &'static str {
        type_name::<S>()
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let set = downcast_host::<S>(host)?;
        let mut values = Vec::new();
        for elem in set.elems() {
            values.push(self.element.encode(elem as &dyn Any)?);
        }
        Ok(Value::List(values))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let values = native
            .as_list()
            .ok_or_else(|| ConversionError::unexpected_kind(ValueKind::List, native.kind()))?;
        let mut set = S::empty();
        for value in values {
            if !supported_set_element(value.kind()) {
                return Err(ConversionError::unsupported_element(value.kind(), "set"));
            }
            let boxed = self.element.decode(value)?;
            let elem = boxed
                .downcast::<S::Elem>()
                .map_err(|_| ConversionError::host_type(type_name::<S::Elem>()))?;
            set.add(*elem);
        }
        Ok(Box::new(set))
    }
}

/// Shared converter for `Vec<String>`.
pub static TEXT_LIST: ListConverter<String> = ListConverter::new(&TEXT);
/// Shared converter for `Vec<i64>`.
pub static INTEGER_LIST: ListConverter<i64> = ListConverter::new(&INTEGER);
/// Shared converter for `Vec<bool>`.
pub static BOOL_LIST: ListConverter<bool> = ListConverter::new(&BOOL);
/// Shared converter for `Vec<f64>`.
pub static DOUBLE_LIST: ListConverter<f64> = ListConverter::new(&DOUBLE);
/// Shared converter for `Vec<Key>`.
pub static KEY_LIST: ListConverter<Key> = ListConverter::new(&KEY);

/// Shared converter for `HashSet<String>`.
pub static TEXT_HASH_SET: SetConverter<HashSet<String>> = SetConverter::new(&TEXT);
/// Shared converter for `HashSet<i64>`.
pub static INTEGER_HASH_SET: SetConverter<HashSet<i64>> = SetConverter::new(&INTEGER);
/// Shared converter for `HashSet<bool>`.
pub static BOOL_HASH_SET: SetConverter<HashSet<bool>> = SetConverter::new(&BOOL);
/// Shared converter for `HashSet<Key>`.
pub static KEY_HASH_SET: SetConverter<HashSet<Key>> = SetConverter::new(&KEY);

/// Shared converter for `BTreeSet<String>`.
pub static TEXT_TREE_SET: SetConverter<BTreeSet<String>> = SetConverter::new(&TEXT);
/// Shared converter for `BTreeSet<i64>`.
pub static INTEGER_TREE_SET: SetConverter<BTreeSet<i64>> = SetConverter::new(&INTEGER);
/// Shared converter for `BTreeSet<bool>`.
pub static BOOL_TREE_SET: SetConverter<BTreeSet<bool>> = SetConverter::new(&BOOL);
/// Shared converter for `BTreeSet<Key>`.
pub static KEY_TREE_SET: SetConverter<BTreeSet<Key>> = SetConverter::new(&KEY);

#[cfg(test)]
mod tests {
    use super::*;
    use entimap_value::Entity;

    #[test]
    fn string_lists_round_trip_in_order() {
        let items = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let native = TEXT_LIST.encode(&items).unwrap();
        assert_eq!(
            native,
            Value::List(vec![
                Value::Text("b".to_string()),
                Value::Text("a".to_string()),
                Value::Text("b".to_string()),
            ])
        );

        let back = TEXT_LIST.decode(&native).unwrap();
        assert_eq!(*back.downcast::<Vec<String>>().unwrap(), items);
    }

    #[test]
    fn tree_sets_come_back_sorted_and_deduplicated() {
        let native = Value::List(vec![
            Value::Integer(3),
            Value::Integer(1),
            Value::Integer(3),
        ]);
        let back = INTEGER_TREE_SET.decode(&native).unwrap();
        let set = back.downcast::<BTreeSet<i64>>().unwrap();
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn hash_sets_round_trip_as_contents() {
        let mut set = HashSet::new();
        set.insert("x".to_string());
        set.insert("y".to_string());

        let native = TEXT_HASH_SET.encode(&set).unwrap();
        let back = TEXT_HASH_SET.decode(&native).unwrap();
        assert_eq!(*back.downcast::<HashSet<String>>().unwrap(), set);
    }

    #[test]
    fn key_sets_hold_references() {
        let mut set = BTreeSet::new();
        set.insert(Key::numeric("User", 1));
        set.insert(Key::numeric("User", 2));

        let native = KEY_TREE_SET.encode(&set).unwrap();
        let back = KEY_TREE_SET.decode(&native).unwrap();
        assert_eq!(*back.downcast::<BTreeSet<Key>>().unwrap(), set);
    }

    #[test]
    fn unsupported_element_kinds_are_reported_by_container() {
        let nested = Value::List(vec![Value::Entity(Entity::builder().build())]);
        let err = TEXT_LIST.decode(&nested).unwrap_err();
        assert_eq!(err.to_string(), "unsupported type entity in list");

        let err = TEXT_HASH_SET.decode(&nested).unwrap_err();
        assert_eq!(err.to_string(), "unsupported type entity in set");

        let nulls = Value::List(vec![Value::Null]);
        let err = INTEGER_LIST.decode(&nulls).unwrap_err();
        assert_eq!(err.to_string(), "unsupported type null in list");
    }

    #[test]
    fn doubles_are_list_only() {
        let native = Value::List(vec![Value::Double(1.5)]);
        assert!(DOUBLE_LIST.decode(&native).is_ok());

        let err = INTEGER_TREE_SET.decode(&native).unwrap_err();
        assert_eq!(err.to_string(), "unsupported type double in set");
    }

    #[test]
    fn heterogeneous_lists_fail_on_the_offending_element() {
        let native = Value::List(vec![Value::Text("a".to_string()), Value::Integer(1)]);
        let err = TEXT_LIST.decode(&native).unwrap_err();
        assert_eq!(err.to_string(), "expecting text, but found integer");
    }

    #[test]
    fn non_list_values_are_rejected() {
        let err = TEXT_LIST.decode(&Value::Text("a".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "expecting list, but found text");
    }
}
