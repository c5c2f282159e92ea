//! Native entities: named property bags with identity and ancestry.

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::value::Value;

/// One stored property: a value plus its indexing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    value: Value,
    excluded_from_indexes: bool,
}

impl Property {
    /// Create a property with default indexing.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            excluded_from_indexes: false,
        }
    }

    /// Create a property excluded from indexes.
    pub fn excluded(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            excluded_from_indexes: true,
        }
    }

    /// The stored value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the property, yielding its value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Whether this property is excluded from indexes.
    pub fn excluded_from_indexes(&self) -> bool {
        self.excluded_from_indexes
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Property::new(value)
    }
}

/// A native entity: an ordered mapping from stored names to properties,
/// with an optional key carrying identity and ancestry.
///
/// Property order is insertion order; setting an existing name replaces the
/// value in place. Lookups are linear, which is the right trade for the
/// small property counts entities carry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    key: Option<Key>,
    properties: Vec<(String, Property)>,
}

impl Entity {
    /// Start building an entity.
    pub fn builder() -> EntityBuilder {
        EntityBuilder::new()
    }

    /// Start building a copy of this entity, preserving key, property
    /// order, and indexing state.
    pub fn to_builder(&self) -> EntityBuilder {
        EntityBuilder {
            key: self.key.clone(),
            properties: self.properties.clone(),
        }
    }

    /// The entity's key, if assigned.
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Whether a property with the given stored name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.properties.iter().any(|(n, _)| n == name)
    }

    /// Look up a property's value by stored name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.property(name).map(Property::value)
    }

    /// Look up a property by stored name, including its indexing state.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    /// Iterate properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// Stored names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(n, _)| n.as_str())
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the entity has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Builder for [`Entity`].
#[derive(Debug, Clone, Default)]
pub struct EntityBuilder {
    key: Option<Key>,
    properties: Vec<(String, Property)>,
}

impl EntityBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            key: None,
            properties: Vec::new(),
        }
    }

    /// Create a builder pre-populated from an existing entity.
    pub fn from_entity(entity: &Entity) -> Self {
        entity.to_builder()
    }

    /// Set the entity key.
    #[must_use]
    pub fn key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Set a property with default indexing, replacing any existing
    /// property of the same name in place.
    #[must_use]
    pub fn set(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, Property::new(value))
    }

    /// Set a property, replacing any existing property of the same name in
    /// place.
    #[must_use]
    pub fn set_property(mut self, name: impl Into<String>, property: Property) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = property,
            None => self.properties.push((name, property)),
        }
        self
    }

    /// Finish building.
    pub fn build(self) -> Entity {
        Entity {
            key: self.key,
            properties: self.properties,
        }
    }
}
