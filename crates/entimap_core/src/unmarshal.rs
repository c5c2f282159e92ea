//! The native entity to model walk.
//!
//! Unmarshalling instantiates the construction target, writes the identity
//! in from the key, populates every mapped field whose stored property is
//! present, and finalizes builder-constructed types last. Absent stored
//! properties are tolerated everywhere; the field keeps whatever the fresh
//! instance held.

use std::any::Any;

use entimap_value::{Entity, Value, ValueKind};

use crate::descriptor::StorageStrategy;
use crate::error::{ConversionError, MappingError, MappingResult};
use crate::metadata::{EmbeddedMetadata, EntityMetadata, PropertyMetadata};

/// Unmarshals a native entity into an erased instance of the metadata's
/// model type.
pub(crate) fn unmarshal_instance(
    metadata: &EntityMetadata,
    native: &Entity,
) -> MappingResult<Box<dyn Any>> {
    let entity_name = metadata.entity_type_name;
    let mut instance = metadata.construction.instantiate();

    write_identity(metadata, native, instance.as_mut())?;
    populate_fields(
        entity_name,
        &metadata.properties,
        &metadata.embedded,
        native,
        instance.as_mut(),
    )?;

    metadata
        .construction
        .finish(instance)
        .map_err(|source| MappingError::construction(entity_name, source))
}

/// Writes the identifier, key, and parent key fields from the native key.
///
/// A keyless entity writes nothing; an incomplete key writes the key fields
/// but leaves the identifier unassigned.
fn write_identity(
    metadata: &EntityMetadata,
    native: &Entity,
    instance: &mut dyn Any,
) -> MappingResult<()> {
    let entity_name = metadata.entity_type_name;
    let Some(key) = native.key() else {
        return Ok(());
    };

    if let Some(id) = key.id() {
        (metadata.identifier.writer)(instance, id)
            .map_err(|source| MappingError::identifier(entity_name, source))?;
    }

    if let Some(key_meta) = &metadata.key {
        (key_meta.writer)(instance, key.clone())
            .map_err(|source| MappingError::key(entity_name, source))?;
    }

    if let Some(parent_meta) = &metadata.parent_key {
        if let Some(parent) = key.parent() {
            (parent_meta.writer)(instance, parent.clone())
                .map_err(|source| MappingError::key(entity_name, source))?;
        }
    }

    Ok(())
}

fn populate_fields(
    scope_name: &'static str,
    properties: &[PropertyMetadata],
    embedded: &[EmbeddedMetadata],
    native: &Entity,
    instance: &mut dyn Any,
) -> MappingResult<()> {
    for property in properties {
        let Some(value) = native.get(&property.stored_name) else {
            continue;
        };
        let host = property.converter.get().to_host(value).map_err(|source| {
            MappingError::property(scope_name, property.stored_name.clone(), source)
        })?;
        (property.writer)(instance, host).map_err(|source| {
            MappingError::property(scope_name, property.stored_name.clone(), source)
        })?;
    }

    for nested in embedded {
        populate_embedded(scope_name, nested, native, instance)?;
    }

    Ok(())
}

fn populate_embedded(
    scope_name: &'static str,
    nested: &EmbeddedMetadata,
    native: &Entity,
    instance: &mut dyn Any,
) -> MappingResult<()> {
    match nested.strategy {
        StorageStrategy::Exploded => {
            // Always reconstructed; absent stored values leave the nested
            // model's own defaults in place.
            let mut sub = nested.construction.instantiate();
            populate_fields(
                nested.type_name,
                &nested.properties,
                &nested.embedded,
                native,
                sub.as_mut(),
            )?;
            let product = nested
                .construction
                .finish(sub)
                .map_err(|source| MappingError::construction(nested.type_name, source))?;
            (nested.writer)(instance, Some(product)).map_err(|source| {
                MappingError::property(scope_name, nested.stored_name.clone(), source)
            })?;
        }
        StorageStrategy::Imploded => {
            let Some(value) = native.get(&nested.stored_name) else {
                return Ok(());
            };
            match value {
                Value::Null => {
                    (nested.writer)(instance, None).map_err(|source| {
                        MappingError::property(scope_name, nested.stored_name.clone(), source)
                    })?;
                }
                Value::Entity(sub_native) => {
                    let mut sub = nested.construction.instantiate();
                    populate_fields(
                        nested.type_name,
                        &nested.properties,
                        &nested.embedded,
                        sub_native,
                        sub.as_mut(),
                    )?;
                    let product = nested
                        .construction
                        .finish(sub)
                        .map_err(|source| MappingError::construction(nested.type_name, source))?;
                    (nested.writer)(instance, Some(product)).map_err(|source| {
                        MappingError::property(scope_name, nested.stored_name.clone(), source)
                    })?;
                }
                other => {
                    return Err(MappingError::property(
                        scope_name,
                        nested.stored_name.clone(),
                        ConversionError::unexpected_kind(ValueKind::Entity, other.kind()),
                    ));
                }
            }
        }
    }

    Ok(())
}
