//! Declarative model descriptors.
//!
//! A descriptor tells the engine how one model type maps onto a native
//! entity: which closures read and write each field, which field carries the
//! identity, how instances are constructed, and how nested models are laid
//! out. Descriptors are plain data plus type-erased closures; resolving one
//! into validated runtime metadata happens in the registry.
//!
//! Model types implement [`Persistable`] (top level) or [`Embeddable`]
//! (nested) by returning a descriptor built with the chained methods here:
//!
//! ```
//! use entimap_core::descriptor::{EntityDescriptor, IdField, Persistable, PropertyField};
//!
//! #[derive(Default)]
//! struct Task {
//!     id: Option<i64>,
//!     title: String,
//! }
//!
//! impl Persistable for Task {
//!     fn descriptor() -> EntityDescriptor {
//!         EntityDescriptor::direct::<Task>("Task")
//!             .id(IdField::new(|t: &Task| t.id, |t: &mut Task, id: i64| {
//!                 t.id = Some(id);
//!             })
//!             .auto_generated())
//!             .field(PropertyField::new(
//!                 "title",
//!                 |t: &Task| t.title.clone(),
//!                 |t: &mut Task, v: String| t.title = v,
//!             ))
//!     }
//! }
//! ```

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use entimap_value::{Key, KeyId};

use crate::convert::{IdKind, IdentifierValue, ValueConverter};
use crate::error::{ConversionError, ConversionResult};
use crate::index::SecondaryIndexer;

/// Reads one field out of an erased instance.
///
/// `Ok(None)` means the host holds no value for the field.
pub(crate) type ErasedReader =
    Arc<dyn Fn(&dyn Any) -> ConversionResult<Option<Box<dyn Any>>> + Send + Sync>;

/// Writes one field into an erased instance. `None` carries a stored null;
/// bindings without a null representation reject it.
pub(crate) type ErasedWriter =
    Arc<dyn Fn(&mut dyn Any, Option<Box<dyn Any>>) -> ConversionResult<()> + Send + Sync>;

pub(crate) type ErasedIdReader =
    Arc<dyn Fn(&dyn Any) -> ConversionResult<Option<KeyId>> + Send + Sync>;

pub(crate) type ErasedIdWriter =
    Arc<dyn Fn(&mut dyn Any, &KeyId) -> ConversionResult<()> + Send + Sync>;

pub(crate) type ErasedKeyReader =
    Arc<dyn Fn(&dyn Any) -> ConversionResult<Option<Key>> + Send + Sync>;

pub(crate) type ErasedKeyWriter =
    Arc<dyn Fn(&mut dyn Any, Key) -> ConversionResult<()> + Send + Sync>;

pub(crate) type ErasedInstantiate = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;

pub(crate) type ErasedFinish =
    Arc<dyn Fn(Box<dyn Any>) -> ConversionResult<Box<dyn Any>> + Send + Sync>;

/// A binding target: the concrete type an erased accessor downcasts to.
pub(crate) type BindingTarget = (TypeId, &'static str);

/// A model type mapped to top-level entities.
pub trait Persistable: 'static {
    /// Returns the mapping descriptor for this type.
    fn descriptor() -> EntityDescriptor;
}

/// A model type nested inside another model.
///
/// Embeddables carry no identity of their own; their properties live inside
/// the owning entity under the layout chosen by [`StorageStrategy`].
pub trait Embeddable: 'static {
    /// Returns the mapping descriptor for this type.
    fn descriptor() -> EmbeddedDescriptor;
}

/// How an embedded model's properties are laid out in the owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageStrategy {
    /// Properties are hoisted into the owning entity as siblings of its own
    /// properties. The default.
    #[default]
    Exploded,
    /// The embedded model is stored as one nested entity under the field's
    /// stored name.
    Imploded,
}

/// How instances of a model type come into being during unmarshalling.
#[derive(Clone)]
pub(crate) enum ConstructionSpec {
    /// Instances start from `Default::default()` and are mutated in place.
    Direct {
        instantiate: ErasedInstantiate,
        product: TypeId,
        product_name: &'static str,
    },
    /// Instances are accumulated in a builder and finalized once populated.
    Builder {
        instantiate: ErasedInstantiate,
        finish: ErasedFinish,
        builder: TypeId,
        builder_name: &'static str,
        product: TypeId,
        product_name: &'static str,
    },
}

impl ConstructionSpec {
    fn direct<T: Default + 'static>() -> Self {
        Self::Direct {
            instantiate: Arc::new(|| Box::new(T::default())),
            product: TypeId::of::<T>(),
            product_name: type_name::<T>(),
        }
    }

    fn with_builder<T, B, N, F>(new_builder: N, finish: F) -> Self
    where
        T: 'static,
        B: 'static,
        N: Fn() -> B + Send + Sync + 'static,
        F: Fn(B) -> T + Send + Sync + 'static,
    {
        Self::Builder {
            instantiate: Arc::new(move || Box::new(new_builder())),
            finish: Arc::new(move |boxed| {
                let builder = boxed
                    .downcast::<B>()
                    .map_err(|_| ConversionError::host_type(type_name::<B>()))?;
                Ok(Box::new(finish(*builder)) as Box<dyn Any>)
            }),
            builder: TypeId::of::<B>(),
            builder_name: type_name::<B>(),
            product: TypeId::of::<T>(),
            product_name: type_name::<T>(),
        }
    }

    /// The type writers bind against: the product for direct construction,
    /// the builder otherwise.
    pub(crate) fn target_type(&self) -> BindingTarget {
        match self {
            Self::Direct {
                product,
                product_name,
                ..
            } => (*product, product_name),
            Self::Builder {
                builder,
                builder_name,
                ..
            } => (*builder, builder_name),
        }
    }

    /// The finished model type.
    pub(crate) fn product_type(&self) -> BindingTarget {
        match self {
            Self::Direct {
                product,
                product_name,
                ..
            }
            | Self::Builder {
                product,
                product_name,
                ..
            } => (*product, product_name),
        }
    }

    /// Creates a fresh, unpopulated instance of the target type.
    pub(crate) fn instantiate(&self) -> Box<dyn Any> {
        match self {
            Self::Direct { instantiate, .. } | Self::Builder { instantiate, .. } => instantiate(),
        }
    }

    /// Turns a populated target into the finished model.
    pub(crate) fn finish(&self, instance: Box<dyn Any>) -> ConversionResult<Box<dyn Any>> {
        match self {
            Self::Direct { .. } => Ok(instance),
            Self::Builder { finish, .. } => finish(instance),
        }
    }
}

/// One declared field of a descriptor.
pub(crate) enum FieldEntry {
    /// A plain property, either opportunistically mapped (`field`) or
    /// explicitly declared (`property`).
    Property {
        field: PropertyField,
        explicit: bool,
    },
    /// A nested model.
    Embedded(EmbeddedField),
}

/// The mapping descriptor of a top-level model type.
///
/// Declaration order is preserved: properties marshal in the order they were
/// added here.
pub struct EntityDescriptor {
    pub(crate) kind: String,
    pub(crate) construction: ConstructionSpec,
    pub(crate) ids: Vec<IdField>,
    pub(crate) keys: Vec<KeyField>,
    pub(crate) parent_keys: Vec<ParentKeyField>,
    pub(crate) fields: Vec<FieldEntry>,
    pub(crate) version: Option<String>,
}

impl EntityDescriptor {
    /// Starts a descriptor for a type constructed via `Default` and mutated
    /// in place.
    pub fn direct<E: Default + 'static>(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            construction: ConstructionSpec::direct::<E>(),
            ids: Vec::new(),
            keys: Vec::new(),
            parent_keys: Vec::new(),
            fields: Vec::new(),
            version: None,
        }
    }

    /// Starts a descriptor for a type assembled through a builder.
    ///
    /// `new_builder` produces an empty builder, writers populate it, and
    /// `finish` turns it into the model once every stored value has been
    /// applied.
    pub fn with_builder<E, B, N, F>(kind: impl Into<String>, new_builder: N, finish: F) -> Self
    where
        E: 'static,
        B: 'static,
        N: Fn() -> B + Send + Sync + 'static,
        F: Fn(B) -> E + Send + Sync + 'static,
    {
        Self {
            kind: kind.into(),
            construction: ConstructionSpec::with_builder::<E, B, N, F>(new_builder, finish),
            ids: Vec::new(),
            keys: Vec::new(),
            parent_keys: Vec::new(),
            fields: Vec::new(),
            version: None,
        }
    }

    /// The native kind entities of this type are stored under.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Declares the identifier field.
    #[must_use]
    pub fn id(mut self, field: IdField) -> Self {
        self.ids.push(field);
        self
    }

    /// Declares a field holding the entity's own full key.
    #[must_use]
    pub fn key(mut self, field: KeyField) -> Self {
        self.keys.push(field);
        self
    }

    /// Declares a field holding the parent key.
    #[must_use]
    pub fn parent_key(mut self, field: ParentKeyField) -> Self {
        self.parent_keys.push(field);
        self
    }

    /// Declares an opportunistically mapped property.
    ///
    /// Incomplete bindings (a missing reader or writer) are skipped during
    /// resolution rather than rejected.
    #[must_use]
    pub fn field(mut self, field: PropertyField) -> Self {
        self.fields.push(FieldEntry::Property {
            field,
            explicit: false,
        });
        self
    }

    /// Declares an explicitly mapped property.
    ///
    /// Unlike [`EntityDescriptor::field`], an incomplete binding here is a
    /// metadata error.
    #[must_use]
    pub fn property(mut self, field: PropertyField) -> Self {
        self.fields.push(FieldEntry::Property {
            field,
            explicit: true,
        });
        self
    }

    /// Declares a nested model field.
    #[must_use]
    pub fn embedded(mut self, field: EmbeddedField) -> Self {
        self.fields.push(FieldEntry::Embedded(field));
        self
    }

    /// Designates a declared property, by stored name, as the optimistic
    /// concurrency version.
    #[must_use]
    pub fn version_property(mut self, name: impl Into<String>) -> Self {
        self.version = Some(name.into());
        self
    }
}

/// The mapping descriptor of an embedded model type.
pub struct EmbeddedDescriptor {
    pub(crate) type_name: &'static str,
    pub(crate) construction: ConstructionSpec,
    pub(crate) fields: Vec<FieldEntry>,
}

impl EmbeddedDescriptor {
    /// Starts a descriptor for an embedded type constructed via `Default`.
    pub fn direct<M: Default + 'static>() -> Self {
        Self {
            type_name: type_name::<M>(),
            construction: ConstructionSpec::direct::<M>(),
            fields: Vec::new(),
        }
    }

    /// Starts a descriptor for an embedded type assembled through a builder.
    pub fn with_builder<M, B, N, F>(new_builder: N, finish: F) -> Self
    where
        M: 'static,
        B: 'static,
        N: Fn() -> B + Send + Sync + 'static,
        F: Fn(B) -> M + Send + Sync + 'static,
    {
        Self {
            type_name: type_name::<M>(),
            construction: ConstructionSpec::with_builder::<M, B, N, F>(new_builder, finish),
            fields: Vec::new(),
        }
    }

    /// Declares an opportunistically mapped property.
    #[must_use]
    pub fn field(mut self, field: PropertyField) -> Self {
        self.fields.push(FieldEntry::Property {
            field,
            explicit: false,
        });
        self
    }

    /// Declares an explicitly mapped property.
    #[must_use]
    pub fn property(mut self, field: PropertyField) -> Self {
        self.fields.push(FieldEntry::Property {
            field,
            explicit: true,
        });
        self
    }

    /// Declares a nested model field. Nesting may recurse to any depth.
    #[must_use]
    pub fn embedded(mut self, field: EmbeddedField) -> Self {
        self.fields.push(FieldEntry::Embedded(field));
        self
    }
}

/// Declaration of one stored property and its field bindings.
pub struct PropertyField {
    pub(crate) name: String,
    pub(crate) stored_name: Option<String>,
    pub(crate) value_type: TypeId,
    pub(crate) value_type_name: &'static str,
    pub(crate) reader: Option<ErasedReader>,
    pub(crate) reader_target: Option<BindingTarget>,
    pub(crate) writer: Option<ErasedWriter>,
    pub(crate) writer_target: Option<BindingTarget>,
    pub(crate) converter: Option<Arc<dyn ValueConverter>>,
    pub(crate) indexed: bool,
    pub(crate) optional: bool,
    pub(crate) secondary_index: Option<SecondaryIndexSpec>,
}

impl PropertyField {
    /// Declares a property with a value on both sides: the reader always
    /// produces one, the writer always expects one.
    ///
    /// A stored null arriving at such a binding is a mapping error; use
    /// [`PropertyField::nullable`] when the field can be absent.
    pub fn new<E, B, V, R, W>(name: impl Into<String>, read: R, write: W) -> Self
    where
        E: 'static,
        B: 'static,
        V: 'static,
        R: Fn(&E) -> V + Send + Sync + 'static,
        W: Fn(&mut B, V) + Send + Sync + 'static,
    {
        let reader: ErasedReader = Arc::new(move |instance| {
            let entity = instance
                .downcast_ref::<E>()
                .ok_or_else(|| ConversionError::host_type(type_name::<E>()))?;
            Ok(Some(Box::new(read(entity)) as Box<dyn Any>))
        });
        let writer: ErasedWriter = Arc::new(move |instance, value| {
            let target = instance
                .downcast_mut::<B>()
                .ok_or_else(|| ConversionError::host_type(type_name::<B>()))?;
            let value = value.ok_or(ConversionError::UnexpectedNull)?;
            let value = value
                .downcast::<V>()
                .map_err(|_| ConversionError::host_type(type_name::<V>()))?;
            write(target, *value);
            Ok(())
        });
        Self {
            name: name.into(),
            stored_name: None,
            value_type: TypeId::of::<V>(),
            value_type_name: type_name::<V>(),
            reader: Some(reader),
            reader_target: Some((TypeId::of::<E>(), type_name::<E>())),
            writer: Some(writer),
            writer_target: Some((TypeId::of::<B>(), type_name::<B>())),
            converter: None,
            indexed: true,
            optional: false,
            secondary_index: None,
        }
    }

    /// Declares a property backed by an `Option` field.
    ///
    /// `None` marshals to a stored null and a stored null unmarshals back to
    /// `None`.
    pub fn nullable<E, B, V, R, W>(name: impl Into<String>, read: R, write: W) -> Self
    where
        E: 'static,
        B: 'static,
        V: 'static,
        R: Fn(&E) -> Option<V> + Send + Sync + 'static,
        W: Fn(&mut B, Option<V>) + Send + Sync + 'static,
    {
        let reader: ErasedReader = Arc::new(move |instance| {
            let entity = instance
                .downcast_ref::<E>()
                .ok_or_else(|| ConversionError::host_type(type_name::<E>()))?;
            Ok(read(entity).map(|value| Box::new(value) as Box<dyn Any>))
        });
        let writer: ErasedWriter = Arc::new(move |instance, value| {
            let target = instance
                .downcast_mut::<B>()
                .ok_or_else(|| ConversionError::host_type(type_name::<B>()))?;
            match value {
                None => write(target, None),
                Some(value) => {
                    let value = value
                        .downcast::<V>()
                        .map_err(|_| ConversionError::host_type(type_name::<V>()))?;
                    write(target, Some(*value));
                }
            }
            Ok(())
        });
        Self {
            name: name.into(),
            stored_name: None,
            value_type: TypeId::of::<V>(),
            value_type_name: type_name::<V>(),
            reader: Some(reader),
            reader_target: Some((TypeId::of::<E>(), type_name::<E>())),
            writer: Some(writer),
            writer_target: Some((TypeId::of::<B>(), type_name::<B>())),
            converter: None,
            indexed: true,
            optional: false,
            secondary_index: None,
        }
    }

    /// Declares a property with only a reader.
    ///
    /// Under `field` the missing writer makes the property skip; under
    /// `property` it is a metadata error.
    pub fn read_only<E, V, R>(name: impl Into<String>, read: R) -> Self
    where
        E: 'static,
        V: 'static,
        R: Fn(&E) -> V + Send + Sync + 'static,
    {
        let reader: ErasedReader = Arc::new(move |instance| {
            let entity = instance
                .downcast_ref::<E>()
                .ok_or_else(|| ConversionError::host_type(type_name::<E>()))?;
            Ok(Some(Box::new(read(entity)) as Box<dyn Any>))
        });
        Self {
            name: name.into(),
            stored_name: None,
            value_type: TypeId::of::<V>(),
            value_type_name: type_name::<V>(),
            reader: Some(reader),
            reader_target: Some((TypeId::of::<E>(), type_name::<E>())),
            writer: None,
            writer_target: None,
            converter: None,
            indexed: true,
            optional: false,
            secondary_index: None,
        }
    }

    /// Declares a property with only a writer.
    pub fn write_only<B, V, W>(name: impl Into<String>, write: W) -> Self
    where
        B: 'static,
        V: 'static,
        W: Fn(&mut B, V) + Send + Sync + 'static,
    {
        let writer: ErasedWriter = Arc::new(move |instance, value| {
            let target = instance
                .downcast_mut::<B>()
                .ok_or_else(|| ConversionError::host_type(type_name::<B>()))?;
            let value = value.ok_or(ConversionError::UnexpectedNull)?;
            let value = value
                .downcast::<V>()
                .map_err(|_| ConversionError::host_type(type_name::<V>()))?;
            write(target, *value);
            Ok(())
        });
        Self {
            name: name.into(),
            stored_name: None,
            value_type: TypeId::of::<V>(),
            value_type_name: type_name::<V>(),
            reader: None,
            reader_target: None,
            writer: Some(writer),
            writer_target: Some((TypeId::of::<B>(), type_name::<B>())),
            converter: None,
            indexed: true,
            optional: false,
            secondary_index: None,
        }
    }

    /// Stores the property under a different name than the field.
    #[must_use]
    pub fn stored_as(mut self, name: impl Into<String>) -> Self {
        self.stored_name = Some(name.into());
        self
    }

    /// Excludes the property from the store's indexes where the value kind
    /// allows it.
    #[must_use]
    pub fn unindexed(mut self) -> Self {
        self.indexed = false;
        self
    }

    /// Skips the property entirely when the host value is absent, instead of
    /// storing an explicit null.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Overrides the built-in converter lookup for this field.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Adds a secondary index under the default name, a `$` prefix on the
    /// stored name.
    #[must_use]
    pub fn secondary_index(mut self, indexer: Arc<dyn SecondaryIndexer>) -> Self {
        self.secondary_index = Some(SecondaryIndexSpec {
            name: None,
            indexer,
        });
        self
    }

    /// Adds a secondary index under an explicit stored name.
    #[must_use]
    pub fn secondary_index_named(
        mut self,
        name: impl Into<String>,
        indexer: Arc<dyn SecondaryIndexer>,
    ) -> Self {
        self.secondary_index = Some(SecondaryIndexSpec {
            name: Some(name.into()),
            indexer,
        });
        self
    }
}

/// Declaration of a secondary index on a property.
pub(crate) struct SecondaryIndexSpec {
    pub(crate) name: Option<String>,
    pub(crate) indexer: Arc<dyn SecondaryIndexer>,
}

/// Declaration of the identifier field.
pub struct IdField {
    pub(crate) kind: IdKind,
    pub(crate) auto_generate: bool,
    pub(crate) reader: ErasedIdReader,
    pub(crate) writer: ErasedIdWriter,
    pub(crate) reader_target: BindingTarget,
    pub(crate) writer_target: BindingTarget,
}

impl IdField {
    /// Declares the identifier with its read and write bindings.
    ///
    /// The reader returns `None` while the identity is unassigned; the writer
    /// receives the identity read back from a stored key. Any
    /// [`IdentifierValue`] works here, including newtype wrappers.
    pub fn new<E, B, I, R, W>(read: R, write: W) -> Self
    where
        E: 'static,
        B: 'static,
        I: IdentifierValue,
        R: Fn(&E) -> Option<I> + Send + Sync + 'static,
        W: Fn(&mut B, I) + Send + Sync + 'static,
    {
        let reader: ErasedIdReader = Arc::new(move |instance| {
            let entity = instance
                .downcast_ref::<E>()
                .ok_or_else(|| ConversionError::host_type(type_name::<E>()))?;
            Ok(read(entity).map(|id| id.to_key_id()))
        });
        let writer: ErasedIdWriter = Arc::new(move |instance, id| {
            let target = instance
                .downcast_mut::<B>()
                .ok_or_else(|| ConversionError::host_type(type_name::<B>()))?;
            let id = I::from_key_id(id)?;
            write(target, id);
            Ok(())
        });
        Self {
            kind: I::KIND,
            auto_generate: false,
            reader,
            writer,
            reader_target: (TypeId::of::<E>(), type_name::<E>()),
            writer_target: (TypeId::of::<B>(), type_name::<B>()),
        }
    }

    /// Marks the identifier as store-allocated: an unassigned identity
    /// marshals to an incomplete key instead of failing.
    #[must_use]
    pub fn auto_generated(mut self) -> Self {
        self.auto_generate = true;
        self
    }
}

/// Declaration of a field holding the entity's own full key.
pub struct KeyField {
    pub(crate) reader: ErasedKeyReader,
    pub(crate) writer: ErasedKeyWriter,
    pub(crate) reader_target: BindingTarget,
    pub(crate) writer_target: BindingTarget,
}

impl KeyField {
    /// Declares the key field with its read and write bindings.
    pub fn new<E, B, R, W>(read: R, write: W) -> Self
    where
        E: 'static,
        B: 'static,
        R: Fn(&E) -> Option<Key> + Send + Sync + 'static,
        W: Fn(&mut B, Key) + Send + Sync + 'static,
    {
        let reader: ErasedKeyReader = Arc::new(move |instance| {
            let entity = instance
                .downcast_ref::<E>()
                .ok_or_else(|| ConversionError::host_type(type_name::<E>()))?;
            Ok(read(entity))
        });
        let writer: ErasedKeyWriter = Arc::new(move |instance, key| {
            let target = instance
                .downcast_mut::<B>()
                .ok_or_else(|| ConversionError::host_type(type_name::<B>()))?;
            write(target, key);
            Ok(())
        });
        Self {
            reader,
            writer,
            reader_target: (TypeId::of::<E>(), type_name::<E>()),
            writer_target: (TypeId::of::<B>(), type_name::<B>()),
        }
    }
}

/// Declaration of a field holding the parent key.
pub struct ParentKeyField {
    pub(crate) reader: ErasedKeyReader,
    pub(crate) writer: ErasedKeyWriter,
    pub(crate) reader_target: BindingTarget,
    pub(crate) writer_target: BindingTarget,
}

impl ParentKeyField {
    /// Declares the parent key field with its read and write bindings.
    pub fn new<E, B, R, W>(read: R, write: W) -> Self
    where
        E: 'static,
        B: 'static,
        R: Fn(&E) -> Option<Key> + Send + Sync + 'static,
        W: Fn(&mut B, Key) + Send + Sync + 'static,
    {
        let reader: ErasedKeyReader = Arc::new(move |instance| {
            let entity = instance
                .downcast_ref::<E>()
                .ok_or_else(|| ConversionError::host_type(type_name::<E>()))?;
            Ok(read(entity))
        });
        let writer: ErasedKeyWriter = Arc::new(move |instance, key| {
            let target = instance
                .downcast_mut::<B>()
                .ok_or_else(|| ConversionError::host_type(type_name::<B>()))?;
            write(target, key);
            Ok(())
        });
        Self {
            reader,
            writer,
            reader_target: (TypeId::of::<E>(), type_name::<E>()),
            writer_target: (TypeId::of::<B>(), type_name::<B>()),
        }
    }
}

/// Declaration of a nested model field.
pub struct EmbeddedField {
    pub(crate) name: String,
    pub(crate) stored_name: Option<String>,
    pub(crate) strategy: StorageStrategy,
    pub(crate) descriptor: EmbeddedDescriptor,
    pub(crate) value_type: TypeId,
    pub(crate) value_type_name: &'static str,
    pub(crate) reader: ErasedReader,
    pub(crate) writer: ErasedWriter,
    pub(crate) reader_target: BindingTarget,
    pub(crate) writer_target: BindingTarget,
}

impl EmbeddedField {
    /// Declares a nested model that is always present.
    pub fn new<E, B, M, R, W>(name: impl Into<String>, read: R, write: W) -> Self
    where
        E: 'static,
        B: 'static,
        M: Embeddable,
        R: Fn(&E) -> M + Send + Sync + 'static,
        W: Fn(&mut B, M) + Send + Sync + 'static,
    {
        let reader: ErasedReader = Arc::new(move |instance| {
            let entity = instance
                .downcast_ref::<E>()
                .ok_or_else(|| ConversionError::host_type(type_name::<E>()))?;
            Ok(Some(Box::new(read(entity)) as Box<dyn Any>))
        });
        let writer: ErasedWriter = Arc::new(move |instance, value| {
            let target = instance
                .downcast_mut::<B>()
                .ok_or_else(|| ConversionError::host_type(type_name::<B>()))?;
            let value = value.ok_or(ConversionError::UnexpectedNull)?;
            let value = value
                .downcast::<M>()
                .map_err(|_| ConversionError::host_type(type_name::<M>()))?;
            write(target, *value);
            Ok(())
        });
        Self {
            name: name.into(),
            stored_name: None,
            strategy: StorageStrategy::default(),
            descriptor: M::descriptor(),
            value_type: TypeId::of::<M>(),
            value_type_name: type_name::<M>(),
            reader,
            writer,
            reader_target: (TypeId::of::<E>(), type_name::<E>()),
            writer_target: (TypeId::of::<B>(), type_name::<B>()),
        }
    }

    /// Declares a nested model backed by an `Option` field.
    pub fn nullable<E, B, M, R, W>(name: impl Into<String>, read: R, write: W) -> Self
    where
        E: 'static,
        B: 'static,
        M: Embeddable,
        R: Fn(&E) -> Option<M> + Send + Sync + 'static,
        W: Fn(&mut B, Option<M>) + Send + Sync + 'static,
    {
        let reader: ErasedReader = Arc::new(move |instance| {
            let entity = instance
                .downcast_ref::<E>()
                .ok_or_else(|| ConversionError::host_type(type_name::<E>()))?;
            Ok(read(entity).map(|value| Box::new(value) as Box<dyn Any>))
        });
        let writer: ErasedWriter = Arc::new(move |instance, value| {
            let target = instance
                .downcast_mut::<B>()
                .ok_or_else(|| ConversionError::host_type(type_name::<B>()))?;
            match value {
                None => write(target, None),
                Some(value) => {
                    let value = value
                        .downcast::<M>()
                        .map_err(|_| ConversionError::host_type(type_name::<M>()))?;
                    write(target, Some(*value));
                }
            }
            Ok(())
        });
        Self {
            name: name.into(),
            stored_name: None,
            strategy: StorageStrategy::default(),
            descriptor: M::descriptor(),
            value_type: TypeId::of::<M>(),
            value_type_name: type_name::<M>(),
            reader,
            writer,
            reader_target: (TypeId::of::<E>(), type_name::<E>()),
            writer_target: (TypeId::of::<B>(), type_name::<B>()),
        }
    }

    /// Stores the nested model under a different name than the field.
    ///
    /// Under the exploded strategy the name has no effect on layout; it only
    /// names the nested entity under the imploded strategy.
    #[must_use]
    pub fn stored_as(mut self, name: impl Into<String>) -> Self {
        self.stored_name = Some(name.into());
        self
    }

    /// Lays the nested model out as one nested entity.
    #[must_use]
    pub fn imploded(mut self) -> Self {
        self.strategy = StorageStrategy::Imploded;
        self
    }

    /// Chooses the layout strategy explicitly.
    #[must_use]
    pub fn strategy(mut self, strategy: StorageStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
