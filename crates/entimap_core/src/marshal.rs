//! The model to native entity walk.
//!
//! Marshalling reads every mapped field through its erased reader, converts
//! the value, and threads one entity builder through the whole walk.
//! Exploded embeddeds write into the owner's builder; imploded ones build a
//! nested entity and store it as a single value.

use std::any::Any;

use entimap_value::{Entity, EntityBuilder, Key, Property, Value};

use crate::descriptor::StorageStrategy;
use crate::error::{ConversionError, MappingError, MappingResult};
use crate::metadata::{EmbeddedMetadata, EntityMetadata, PropertyMetadata};

/// Marshals one erased model instance into a native entity.
pub(crate) fn marshal_instance(
    metadata: &EntityMetadata,
    instance: &dyn Any,
) -> MappingResult<Entity> {
    let key = assemble_key(metadata, instance)?;
    let builder = marshal_fields(
        metadata.entity_type_name,
        &metadata.properties,
        &metadata.embedded,
        instance,
        Entity::builder().key(key),
    )?;
    Ok(builder.build())
}

/// Builds the entity key from the model's identity fields.
///
/// A populated key field wins outright; otherwise the key is assembled from
/// the identifier and, when present, the parent key field. An unassigned
/// identifier is only acceptable on auto-generated identifiers, where it
/// yields an incomplete key for the store to complete.
fn assemble_key(metadata: &EntityMetadata, instance: &dyn Any) -> MappingResult<Key> {
    let entity_name = metadata.entity_type_name;

    if let Some(key_meta) = &metadata.key {
        let existing =
            (key_meta.reader)(instance).map_err(|source| MappingError::key(entity_name, source))?;
        if let Some(key) = existing {
            return Ok(key);
        }
    }

    let id = (metadata.identifier.reader)(instance)
        .map_err(|source| MappingError::identifier(entity_name, source))?;
    let mut key = match id {
        Some(id) => Key::incomplete(metadata.kind.as_str()).with_id(id),
        None if metadata.identifier.auto_generate => Key::incomplete(metadata.kind.as_str()),
        None => {
            return Err(MappingError::identifier(
                entity_name,
                ConversionError::UnexpectedNull,
            ));
        }
    };

    if let Some(parent_meta) = &metadata.parent_key {
        let parent = (parent_meta.reader)(instance)
            .map_err(|source| MappingError::key(entity_name, source))?;
        if let Some(parent) = parent {
            key = key.with_parent(parent);
        }
    }

    Ok(key)
}

fn marshal_fields(
    scope_name: &'static str,
    properties: &[PropertyMetadata],
    embedded: &[EmbeddedMetadata],
    instance: &dyn Any,
    mut builder: EntityBuilder,
) -> MappingResult<EntityBuilder> {
    for property in properties {
        builder = marshal_property(scope_name, property, instance, builder)?;
    }
    for nested in embedded {
        builder = marshal_embedded(scope_name, nested, instance, builder)?;
    }
    Ok(builder)
}

fn marshal_property(
    scope_name: &'static str,
    property: &PropertyMetadata,
    instance: &dyn Any,
    builder: EntityBuilder,
) -> MappingResult<EntityBuilder> {
    let wrap = |source| MappingError::property(scope_name, property.stored_name.clone(), source);

    let host = (property.reader)(instance).map_err(wrap)?;
    if host.is_none() && property.optional {
        return Ok(builder);
    }

    let native = property
        .converter
        .get()
        .to_native(host.as_deref())
        .map_err(wrap)?;

    // Derived before the main value moves; explicit nulls index as null.
    let secondary = match &property.secondary_index {
        Some(index) => Some((
            index.name.clone(),
            index.indexer.index(&native).map_err(wrap)?,
        )),
        None => None,
    };

    let excluded = !property.indexed && native.kind().supports_index_exclusion();
    let stored = if excluded {
        Property::excluded(native)
    } else {
        Property::new(native)
    };
    let mut builder = builder.set_property(property.stored_name.clone(), stored);

    if let Some((name, value)) = secondary {
        builder = builder.set(name, value);
    }
    Ok(builder)
}

fn marshal_embedded(
    scope_name: &'static str,
    nested: &EmbeddedMetadata,
    instance: &dyn Any,
    builder: EntityBuilder,
) -> MappingResult<EntityBuilder> {
    let host = (nested.reader)(instance)
        .map_err(|source| MappingError::property(scope_name, nested.stored_name.clone(), source))?;

    match nested.strategy {
        StorageStrategy::Exploded => match host {
            // An absent nested model leaves no trace in the owner.
            None => Ok(builder),
            Some(value) => marshal_fields(
                nested.type_name,
                &nested.properties,
                &nested.embedded,
                value.as_ref(),
                builder,
            ),
        },
        StorageStrategy::Imploded => match host {
            None => Ok(builder.set(nested.stored_name.clone(), Value::Null)),
            Some(value) => {
                let sub = marshal_fields(
                    nested.type_name,
                    &nested.properties,
                    &nested.embedded,
                    value.as_ref(),
                    Entity::builder(),
                )?;
                Ok(builder.set(nested.stored_name.clone(), Value::Entity(sub.build())))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{EntityDescriptor, IdField, Persistable, PropertyField};
    use crate::introspect::resolve_entity;
    use entimap_value::KeyId;

    #[derive(Default)]
    struct Note {
        id: Option<i64>,
        body: String,
        draft: Option<String>,
    }

    impl Persistable for Note {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::direct::<Note>("Note")
                .id(IdField::new(
                    |n: &Note| n.id,
                    |n: &mut Note, id: i64| n.id = Some(id),
                )
                .auto_generated())
                .field(
                    PropertyField::new(
                        "body",
                        |n: &Note| n.body.clone(),
                        |n: &mut Note, v: String| n.body = v,
                    )
                    .unindexed(),
                )
                .field(
                    PropertyField::nullable(
                        "draft",
                        |n: &Note| n.draft.clone(),
                        |n: &mut Note, v: Option<String>| n.draft = v,
                    )
                    .optional(),
                )
        }
    }

    #[derive(Default)]
    struct Strict {
        id: Option<i64>,
    }

    impl Persistable for Strict {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::direct::<Strict>("Strict").id(IdField::new(
                |s: &Strict| s.id,
                |s: &mut Strict, id: i64| s.id = Some(id),
            ))
        }
    }

    #[test]
    fn assembles_a_complete_key_from_the_identifier() {
        let metadata = resolve_entity::<Note>(Note::descriptor()).unwrap();
        let note = Note {
            id: Some(4),
            body: "hi".to_string(),
            draft: None,
        };
        let native = marshal_instance(&metadata, &note).unwrap();
        let key = native.key().unwrap();
        assert_eq!(key.kind(), "Note");
        assert_eq!(key.id(), Some(&KeyId::Numeric(4)));
    }

    #[test]
    fn unassigned_auto_generated_identifier_yields_an_incomplete_key() {
        let metadata = resolve_entity::<Note>(Note::descriptor()).unwrap();
        let native = marshal_instance(&metadata, &Note::default()).unwrap();
        assert!(!native.key().unwrap().is_complete());
    }

    #[test]
    fn unassigned_plain_identifier_is_an_error() {
        let metadata = resolve_entity::<Strict>(Strict::descriptor()).unwrap();
        let err = marshal_instance(&metadata, &Strict::default()).unwrap_err();
        assert!(matches!(err, MappingError::Identifier { .. }));
    }

    #[test]
    fn optional_properties_are_skipped_when_absent() {
        let metadata = resolve_entity::<Note>(Note::descriptor()).unwrap();
        let native = marshal_instance(&metadata, &Note::default()).unwrap();
        assert!(!native.contains("draft"));

        let note = Note {
            id: None,
            body: String::new(),
            draft: Some("wip".to_string()),
        };
        let native = marshal_instance(&metadata, &note).unwrap();
        assert_eq!(native.get("draft"), Some(&Value::Text("wip".to_string())));
    }

    #[test]
    fn unindexed_properties_carry_the_exclusion_flag() {
        let metadata = resolve_entity::<Note>(Note::descriptor()).unwrap();
        let native = marshal_instance(&metadata, &Note::default()).unwrap();
        assert!(native.property("body").unwrap().excluded_from_indexes());
    }
}
