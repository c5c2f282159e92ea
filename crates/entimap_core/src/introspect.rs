//! Descriptor resolution and validation.
//!
//! Turns a declarative descriptor into validated [`EntityMetadata`].
//! Structural rules are enforced here, once, so the marshalling walks never
//! re-check them: exactly one identifier, at most one key and parent key
//! field, converters resolved for every kept property, accessors bound to
//! the right types, and stored names unique within their scope.
//!
//! Opportunistic fields (`field`) with a missing accessor are quietly
//! dropped; explicit ones (`property`) fail resolution instead.

use std::any::TypeId;
use std::collections::HashSet;

use tracing::debug;

use entimap_value::ValueKind;

use crate::convert::converter_for;
use crate::descriptor::{
    BindingTarget, EmbeddedDescriptor, EmbeddedField, EntityDescriptor, FieldEntry, Persistable,
    PropertyField, StorageStrategy,
};
use crate::error::{MetadataError, MetadataResult};
use crate::metadata::{
    ConverterRef, EmbeddedMetadata, EntityMetadata, IdentifierMetadata, KeyMetadata,
    ParentKeyMetadata, PropertyMetadata, SecondaryIndexMetadata,
};

/// One level of the resolution walk: the model type whose fields are being
/// resolved and the types its accessors must bind to.
struct Scope {
    type_name: &'static str,
    reader_owner: BindingTarget,
    writer_owner: BindingTarget,
}

/// Resolves the descriptor of `E` into validated metadata.
pub(crate) fn resolve_entity<E: Persistable>(
    descriptor: EntityDescriptor,
) -> MetadataResult<EntityMetadata> {
    let entity_type = TypeId::of::<E>();
    let entity_type_name = std::any::type_name::<E>();

    let EntityDescriptor {
        kind,
        construction,
        mut ids,
        mut keys,
        mut parent_keys,
        fields,
        version,
    } = descriptor;

    let (product, product_name) = construction.product_type();
    if product != entity_type {
        return Err(MetadataError::wrong_product(
            entity_type_name,
            entity_type_name,
            product_name,
        ));
    }

    if ids.len() > 1 {
        return Err(MetadataError::duplicate_identifier(entity_type_name));
    }
    let Some(id_field) = ids.pop() else {
        return Err(MetadataError::missing_identifier(entity_type_name));
    };
    if id_field.reader_target.0 != entity_type {
        return Err(MetadataError::binding_target(
            entity_type_name,
            "id",
            "reader",
            entity_type_name,
            id_field.reader_target.1,
        ));
    }
    let writer_owner = construction.target_type();
    if id_field.writer_target.0 != writer_owner.0 {
        return Err(MetadataError::binding_target(
            entity_type_name,
            "id",
            "writer",
            writer_owner.1,
            id_field.writer_target.1,
        ));
    }
    let identifier = IdentifierMetadata {
        kind: id_field.kind,
        auto_generate: id_field.auto_generate,
        reader: id_field.reader,
        writer: id_field.writer,
    };

    if keys.len() > 1 {
        return Err(MetadataError::duplicate_key(entity_type_name));
    }
    let key = match keys.pop() {
        None => None,
        Some(field) => {
            if field.reader_target.0 != entity_type {
                return Err(MetadataError::binding_target(
                    entity_type_name,
                    "key",
                    "reader",
                    entity_type_name,
                    field.reader_target.1,
                ));
            }
            if field.writer_target.0 != writer_owner.0 {
                return Err(MetadataError::binding_target(
                    entity_type_name,
                    "key",
                    "writer",
                    writer_owner.1,
                    field.writer_target.1,
                ));
            }
            Some(KeyMetadata {
                reader: field.reader,
                writer: field.writer,
            })
        }
    };

    if parent_keys.len() > 1 {
        return Err(MetadataError::duplicate_parent_key(entity_type_name));
    }
    let parent_key = match parent_keys.pop() {
        None => None,
        Some(field) => {
            if field.reader_target.0 != entity_type {
                return Err(MetadataError::binding_target(
                    entity_type_name,
                    "parent_key",
                    "reader",
                    entity_type_name,
                    field.reader_target.1,
                ));
            }
            if field.writer_target.0 != writer_owner.0 {
                return Err(MetadataError::binding_target(
                    entity_type_name,
                    "parent_key",
                    "writer",
                    writer_owner.1,
                    field.writer_target.1,
                ));
            }
            Some(ParentKeyMetadata {
                reader: field.reader,
                writer: field.writer,
            })
        }
    };

    let scope = Scope {
        type_name: entity_type_name,
        reader_owner: (entity_type, entity_type_name),
        writer_owner,
    };
    let (properties, embedded) = resolve_fields(&scope, fields)?;

    let version = match version {
        None => None,
        Some(designated) => {
            let index = properties
                .iter()
                .position(|property| property.stored_name == designated)
                .ok_or_else(|| {
                    MetadataError::unknown_version_property(entity_type_name, designated.as_str())
                })?;
            if properties[index].converter.get().native_kind() != ValueKind::Integer {
                return Err(MetadataError::version_kind(entity_type_name, designated));
            }
            Some(index)
        }
    };

    Ok(EntityMetadata {
        kind,
        entity_type,
        entity_type_name,
        construction,
        identifier,
        key,
        parent_key,
        properties,
        embedded,
        version,
    })
}

/// Resolves the declared fields of one scope, preserving declaration order
/// within properties and within embeddeds.
fn resolve_fields(
    scope: &Scope,
    fields: Vec<FieldEntry>,
) -> MetadataResult<(Vec<PropertyMetadata>, Vec<EmbeddedMetadata>)> {
    let mut properties = Vec::new();
    let mut embedded = Vec::new();
    let mut stored_names: HashSet<String> = HashSet::new();

    for entry in fields {
        match entry {
            FieldEntry::Property { field, explicit } => {
                let Some(property) = resolve_property(scope, field, explicit)? else {
                    continue;
                };
                if !stored_names.insert(property.stored_name.clone()) {
                    return Err(MetadataError::duplicate_property(
                        scope.type_name,
                        property.stored_name,
                    ));
                }
                properties.push(property);
            }
            FieldEntry::Embedded(field) => {
                let nested = resolve_embedded(scope, field)?;
                // Only imploded embeddeds occupy a stored name in this
                // scope; exploded ones scatter their own names instead.
                if nested.strategy == StorageStrategy::Imploded
                    && !stored_names.insert(nested.stored_name.clone())
                {
                    return Err(MetadataError::duplicate_property(
                        scope.type_name,
                        nested.stored_name,
                    ));
                }
                embedded.push(nested);
            }
        }
    }

    Ok((properties, embedded))
}

fn resolve_property(
    scope: &Scope,
    field: PropertyField,
    explicit: bool,
) -> MetadataResult<Option<PropertyMetadata>> {
    let PropertyField {
        name,
        stored_name,
        value_type,
        value_type_name,
        reader,
        reader_target,
        writer,
        writer_target,
        converter,
        indexed,
        optional,
        secondary_index,
    } = field;

    let (reader, reader_target) = match (reader, reader_target) {
        (Some(reader), Some(target)) => (reader, target),
        _ => {
            if explicit {
                return Err(MetadataError::missing_accessor(
                    scope.type_name,
                    name,
                    "reader",
                ));
            }
            debug!(
                "skipping field `{}` on `{}`: no reader binding",
                name, scope.type_name
            );
            return Ok(None);
        }
    };
    let (writer, writer_target) = match (writer, writer_target) {
        (Some(writer), Some(target)) => (writer, target),
        _ => {
            if explicit {
                return Err(MetadataError::missing_accessor(
                    scope.type_name,
                    name,
                    "writer",
                ));
            }
            debug!(
                "skipping field `{}` on `{}`: no writer binding",
                name, scope.type_name
            );
            return Ok(None);
        }
    };

    if reader_target.0 != scope.reader_owner.0 {
        return Err(MetadataError::binding_target(
            scope.type_name,
            name,
            "reader",
            scope.reader_owner.1,
            reader_target.1,
        ));
    }
    if writer_target.0 != scope.writer_owner.0 {
        return Err(MetadataError::binding_target(
            scope.type_name,
            name,
            "writer",
            scope.writer_owner.1,
            writer_target.1,
        ));
    }

    let converter = match converter {
        Some(custom) => ConverterRef::Custom(custom),
        None => match converter_for(value_type) {
            Some(builtin) => ConverterRef::Builtin(builtin),
            None => {
                return Err(MetadataError::unresolved_type(
                    scope.type_name,
                    name,
                    value_type_name,
                ));
            }
        },
    };

    let stored_name = stored_name.unwrap_or_else(|| name.clone());
    let secondary_index = secondary_index.map(|spec| SecondaryIndexMetadata {
        name: spec.name.unwrap_or_else(|| format!("${}", stored_name)),
        indexer: spec.indexer,
    });

    Ok(Some(PropertyMetadata {
        name,
        stored_name,
        value_type_name,
        converter,
        reader,
        writer,
        indexed,
        optional,
        secondary_index,
    }))
}

fn resolve_embedded(scope: &Scope, field: EmbeddedField) -> MetadataResult<EmbeddedMetadata> {
    let EmbeddedField {
        name,
        stored_name,
        strategy,
        descriptor,
        value_type,
        value_type_name,
        reader,
        writer,
        reader_target,
        writer_target,
    } = field;

    if reader_target.0 != scope.reader_owner.0 {
        return Err(MetadataError::binding_target(
            scope.type_name,
            name,
            "reader",
            scope.reader_owner.1,
            reader_target.1,
        ));
    }
    if writer_target.0 != scope.writer_owner.0 {
        return Err(MetadataError::binding_target(
            scope.type_name,
            name,
            "writer",
            scope.writer_owner.1,
            writer_target.1,
        ));
    }

    let EmbeddedDescriptor {
        type_name,
        construction,
        fields,
    } = descriptor;

    let (product, product_name) = construction.product_type();
    if product != value_type {
        return Err(MetadataError::wrong_product(
            type_name,
            value_type_name,
            product_name,
        ));
    }

    let nested_scope = Scope {
        type_name,
        reader_owner: (product, product_name),
        writer_owner: construction.target_type(),
    };
    let (properties, embedded) = resolve_fields(&nested_scope, fields)?;

    let stored_name = stored_name.unwrap_or_else(|| name.clone());
    Ok(EmbeddedMetadata {
        name,
        stored_name,
        strategy,
        type_name,
        construction,
        properties,
        embedded,
        reader,
        writer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::IdField;

    #[derive(Default)]
    struct Person {
        id: Option<i64>,
        name: String,
        age: i32,
    }

    fn person_id() -> IdField {
        IdField::new(
            |p: &Person| p.id,
            |p: &mut Person, id: i64| p.id = Some(id),
        )
    }

    fn name_field() -> PropertyField {
        PropertyField::new(
            "name",
            |p: &Person| p.name.clone(),
            |p: &mut Person, v: String| p.name = v,
        )
    }

    impl Persistable for Person {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::direct::<Person>("Person")
                .id(person_id())
                .field(name_field())
                .field(PropertyField::new(
                    "age",
                    |p: &Person| p.age,
                    |p: &mut Person, v: i32| p.age = v,
                ))
        }
    }

    #[test]
    fn resolves_a_complete_descriptor() {
        let metadata = resolve_entity::<Person>(Person::descriptor()).unwrap();
        assert_eq!(metadata.kind(), "Person");
        assert_eq!(
            metadata.stored_names().collect::<Vec<_>>(),
            vec!["name", "age"]
        );
        assert!(!metadata.auto_generated());
    }

    #[test]
    fn missing_identifier_is_rejected() {
        let descriptor = EntityDescriptor::direct::<Person>("Person").field(name_field());
        let err = resolve_entity::<Person>(descriptor).unwrap_err();
        assert!(matches!(err, MetadataError::MissingIdentifier { .. }));
    }

    #[test]
    fn duplicate_identifier_is_rejected() {
        let descriptor = EntityDescriptor::direct::<Person>("Person")
            .id(person_id())
            .id(person_id());
        let err = resolve_entity::<Person>(descriptor).unwrap_err();
        assert!(matches!(err, MetadataError::DuplicateIdentifier { .. }));
    }

    #[test]
    fn duplicate_stored_names_are_rejected() {
        let descriptor = EntityDescriptor::direct::<Person>("Person")
            .id(person_id())
            .field(name_field())
            .field(
                PropertyField::new(
                    "other",
                    |p: &Person| p.name.clone(),
                    |p: &mut Person, v: String| p.name = v,
                )
                .stored_as("name"),
            );
        let err = resolve_entity::<Person>(descriptor).unwrap_err();
        assert!(err.to_string().contains("duplicate stored name `name`"));
    }

    #[test]
    fn incomplete_opportunistic_bindings_are_skipped() {
        let descriptor = EntityDescriptor::direct::<Person>("Person")
            .id(person_id())
            .field(PropertyField::read_only("name", |p: &Person| {
                p.name.clone()
            }))
            .field(PropertyField::write_only(
                "age",
                |p: &mut Person, v: i32| p.age = v,
            ));
        let metadata = resolve_entity::<Person>(descriptor).unwrap();
        assert_eq!(metadata.stored_names().count(), 0);
    }

    #[test]
    fn incomplete_explicit_bindings_are_errors() {
        let descriptor = EntityDescriptor::direct::<Person>("Person")
            .id(person_id())
            .property(PropertyField::read_only("name", |p: &Person| {
                p.name.clone()
            }));
        let err = resolve_entity::<Person>(descriptor).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::MissingAccessor {
                accessor: "writer",
                ..
            }
        ));
    }

    #[test]
    fn unresolved_value_types_are_rejected() {
        struct Opaque;
        let descriptor = EntityDescriptor::direct::<Person>("Person")
            .id(person_id())
            .field(PropertyField::new(
                "weird",
                |_: &Person| Opaque,
                |_: &mut Person, _: Opaque| {},
            ));
        let err = resolve_entity::<Person>(descriptor).unwrap_err();
        assert!(matches!(err, MetadataError::UnresolvedType { .. }));
    }

    #[test]
    fn foreign_bindings_are_rejected() {
        #[derive(Default)]
        struct Other {
            name: String,
        }
        let descriptor = EntityDescriptor::direct::<Person>("Person")
            .id(person_id())
            .field(PropertyField::new(
                "name",
                |o: &Other| o.name.clone(),
                |o: &mut Other, v: String| o.name = v,
            ));
        let err = resolve_entity::<Person>(descriptor).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::BindingTarget {
                accessor: "reader",
                ..
            }
        ));
    }

    #[test]
    fn version_must_name_an_integer_property() {
        let descriptor = Person::descriptor().version_property("age");
        let metadata = resolve_entity::<Person>(descriptor).unwrap();
        assert_eq!(metadata.version_property(), Some("age"));

        let descriptor = Person::descriptor().version_property("name");
        let err = resolve_entity::<Person>(descriptor).unwrap_err();
        assert!(matches!(err, MetadataError::VersionKind { .. }));

        let descriptor = Person::descriptor().version_property("missing");
        let err = resolve_entity::<Person>(descriptor).unwrap_err();
        assert!(matches!(err, MetadataError::UnknownVersionProperty { .. }));
    }

    #[test]
    fn wrong_construction_product_is_rejected() {
        #[derive(Default)]
        struct Other;
        let descriptor = EntityDescriptor::direct::<Other>("Person").id(person_id());
        let err = resolve_entity::<Person>(descriptor).unwrap_err();
        assert!(matches!(err, MetadataError::WrongProduct { .. }));
    }
}
