//! The public mapping facade.

use std::sync::Arc;

use tracing::trace;

use entimap_value::{Entity, ValueKind};

use crate::convert::IdKind;
use crate::descriptor::Persistable;
use crate::error::{ConversionError, MappingError, MappingResult, MetadataError};
use crate::marshal::marshal_instance;
use crate::registry::MetadataRegistry;
use crate::unmarshal::unmarshal_instance;

/// Maps model objects to native entities and back.
///
/// A mapper is cheap to clone and safe to share across threads; all state
/// lives in the [`MetadataRegistry`] it wraps. Mappers built over the same
/// registry share resolved metadata.
#[derive(Clone)]
pub struct Mapper {
    registry: Arc<MetadataRegistry>,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(Arc::new(MetadataRegistry::new()))
    }
}

impl Mapper {
    /// Creates a mapper over an existing registry.
    pub fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self { registry }
    }

    /// The registry backing this mapper.
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Marshals a model object into a native entity.
    ///
    /// # Errors
    ///
    /// Fails when the type's descriptor is invalid, when the identifier is
    /// unassigned without being auto-generated, or when any field refuses
    /// conversion.
    pub fn marshal<E: Persistable>(&self, entity: &E) -> MappingResult<Entity> {
        let metadata = self.registry.describe::<E>()?;
        trace!("marshalling `{}`", metadata.entity_type_name());
        marshal_instance(&metadata, entity)
    }

    /// Unmarshals a native entity into a model object.
    ///
    /// Stored properties the model does not map are ignored, and mapped
    /// fields without a stored property keep their construction defaults.
    ///
    /// # Errors
    ///
    /// Fails when the type's descriptor is invalid or when a present stored
    /// value refuses conversion.
    pub fn unmarshal<E: Persistable>(&self, native: &Entity) -> MappingResult<E> {
        let metadata = self.registry.describe::<E>()?;
        trace!("unmarshalling `{}`", metadata.entity_type_name());
        let instance = unmarshal_instance(&metadata, native)?;
        match instance.downcast::<E>() {
            Ok(boxed) => Ok(*boxed),
            Err(_) => Err(MappingError::construction(
                metadata.entity_type_name(),
                ConversionError::host_type(metadata.entity_type_name()),
            )),
        }
    }

    /// Marshals a batch, failing on the first refused object.
    pub fn marshal_all<E: Persistable>(&self, entities: &[E]) -> MappingResult<Vec<Entity>> {
        entities.iter().map(|entity| self.marshal(entity)).collect()
    }

    /// Unmarshals a batch, failing on the first refused entity.
    pub fn unmarshal_all<E: Persistable>(&self, natives: &[Entity]) -> MappingResult<Vec<E>> {
        natives.iter().map(|native| self.unmarshal(native)).collect()
    }

    /// Returns a copy of `native` with the version property of `E` bumped
    /// by one.
    ///
    /// Everything else, the key included, is carried over unchanged. The
    /// count wraps on overflow.
    ///
    /// # Errors
    ///
    /// Fails when `E` designates no version property, when the entity lacks
    /// the stored property, or when the stored value is not an integer.
    pub fn increment_version<E: Persistable>(&self, native: &Entity) -> MappingResult<Entity> {
        let metadata = self.registry.describe::<E>()?;
        let Some(name) = metadata.version_property() else {
            return Err(MetadataError::missing_version(metadata.entity_type_name()).into());
        };
        let Some(value) = native.get(name) else {
            return Err(MappingError::missing_property(
                metadata.entity_type_name(),
                name,
            ));
        };
        let current = value.as_integer().ok_or_else(|| {
            MappingError::property(
                metadata.entity_type_name(),
                name,
                ConversionError::unexpected_kind(ValueKind::Integer, value.kind()),
            )
        })?;
        Ok(native
            .to_builder()
            .set(name, current.wrapping_add(1))
            .build())
    }

    /// Checks that `E` may defer identifier allocation to the store.
    ///
    /// Only numeric identifiers qualify; text identifiers are always
    /// caller-assigned.
    ///
    /// # Errors
    ///
    /// Fails when the identifier of `E` is text-shaped or the descriptor is
    /// invalid.
    pub fn validate_deferred_id_allocation<E: Persistable>(&self) -> MappingResult<()> {
        let metadata = self.registry.describe::<E>()?;
        if metadata.identifier_kind() == IdKind::Text {
            return Err(MetadataError::deferred_allocation(metadata.entity_type_name()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{EntityDescriptor, IdField, PropertyField};
    use entimap_value::{Key, KeyId, Value};

    #[derive(Default, Debug, PartialEq, Clone)]
    struct Ticket {
        id: Option<i64>,
        summary: String,
        revision: i64,
    }

    impl Persistable for Ticket {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::direct::<Ticket>("Ticket")
                .id(IdField::new(
                    |t: &Ticket| t.id,
                    |t: &mut Ticket, id: i64| t.id = Some(id),
                )
                .auto_generated())
                .field(PropertyField::new(
                    "summary",
                    |t: &Ticket| t.summary.clone(),
                    |t: &mut Ticket, v: String| t.summary = v,
                ))
                .field(PropertyField::new(
                    "revision",
                    |t: &Ticket| t.revision,
                    |t: &mut Ticket, v: i64| t.revision = v,
                ))
                .version_property("revision")
        }
    }

    #[derive(Default)]
    struct Tag {
        name: Option<String>,
    }

    impl Persistable for Tag {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::direct::<Tag>("Tag").id(IdField::new(
                |t: &Tag| t.name.clone(),
                |t: &mut Tag, name: String| t.name = Some(name),
            ))
        }
    }

    #[test]
    fn round_trips_a_model() {
        let mapper = Mapper::default();
        let ticket = Ticket {
            id: Some(12),
            summary: "broken build".to_string(),
            revision: 4,
        };

        let native = mapper.marshal(&ticket).unwrap();
        assert_eq!(native.key().unwrap().id(), Some(&KeyId::Numeric(12)));

        let back: Ticket = mapper.unmarshal(&native).unwrap();
        assert_eq!(back, ticket);
    }

    #[test]
    fn batches_fail_fast() {
        let mapper = Mapper::default();
        let tickets = vec![
            Ticket {
                id: Some(1),
                ..Ticket::default()
            },
            Ticket {
                id: Some(2),
                ..Ticket::default()
            },
        ];
        let natives = mapper.marshal_all(&tickets).unwrap();
        assert_eq!(natives.len(), 2);

        let mut natives = natives;
        natives[1] = Entity::builder()
            .key(Key::numeric("Ticket", 2))
            .set("summary", 5i64)
            .build();
        assert!(mapper.unmarshal_all::<Ticket>(&natives).is_err());
    }

    #[test]
    fn increments_the_version_in_a_copy() {
        let mapper = Mapper::default();
        let native = mapper
            .marshal(&Ticket {
                id: Some(1),
                summary: "s".to_string(),
                revision: 41,
            })
            .unwrap();

        let bumped = mapper.increment_version::<Ticket>(&native).unwrap();
        assert_eq!(bumped.get("revision"), Some(&Value::Integer(42)));
        assert_eq!(bumped.get("summary"), native.get("summary"));
        assert_eq!(bumped.key(), native.key());
        // The input entity is untouched.
        assert_eq!(native.get("revision"), Some(&Value::Integer(41)));
    }

    #[test]
    fn increment_requires_the_stored_property() {
        let mapper = Mapper::default();
        let native = Entity::builder().key(Key::numeric("Ticket", 1)).build();
        let err = mapper.increment_version::<Ticket>(&native).unwrap_err();
        assert!(matches!(err, MappingError::MissingProperty { .. }));
    }

    #[test]
    fn increment_requires_a_version_property() {
        let mapper = Mapper::default();
        let native = Entity::builder().key(Key::text("Tag", "rust")).build();
        let err = mapper.increment_version::<Tag>(&native).unwrap_err();
        assert!(matches!(
            err,
            MappingError::Metadata(MetadataError::MissingVersion { .. })
        ));
    }

    #[test]
    fn deferred_allocation_requires_numeric_identifiers() {
        let mapper = Mapper::default();
        assert!(mapper.validate_deferred_id_allocation::<Ticket>().is_ok());

        let err = mapper
            .validate_deferred_id_allocation::<Tag>()
            .unwrap_err();
        assert!(err.to_string().contains("not applicable"));
    }
}
