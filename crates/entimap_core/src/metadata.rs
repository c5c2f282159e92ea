//! Resolved runtime metadata.
//!
//! Metadata is the validated form of a descriptor: stored names resolved,
//! converters looked up, incomplete bindings either skipped or rejected, and
//! structural rules checked. The registry builds it once per model type and
//! shares it behind an `Arc`; the marshalling walks consume it read-only.

use std::any::TypeId;
use std::sync::Arc;

use crate::convert::{IdKind, ValueConverter};
use crate::descriptor::{
    ConstructionSpec, ErasedIdReader, ErasedIdWriter, ErasedKeyReader, ErasedKeyWriter,
    ErasedReader, ErasedWriter, StorageStrategy,
};
use crate::index::SecondaryIndexer;

/// A resolved converter: either a shared built-in or a per-field custom
/// instance.
pub(crate) enum ConverterRef {
    Builtin(&'static dyn ValueConverter),
    Custom(Arc<dyn ValueConverter>),
}

impl ConverterRef {
    pub(crate) fn get(&self) -> &dyn ValueConverter {
        match self {
            Self::Builtin(converter) => *converter,
            Self::Custom(converter) => converter.as_ref(),
        }
    }
}

/// Validated mapping metadata for one model type.
pub struct EntityMetadata {
    pub(crate) kind: String,
    pub(crate) entity_type: TypeId,
    pub(crate) entity_type_name: &'static str,
    pub(crate) construction: ConstructionSpec,
    pub(crate) identifier: IdentifierMetadata,
    pub(crate) key: Option<KeyMetadata>,
    pub(crate) parent_key: Option<ParentKeyMetadata>,
    pub(crate) properties: Vec<PropertyMetadata>,
    pub(crate) embedded: Vec<EmbeddedMetadata>,
    /// Index into `properties` of the version property, if designated.
    pub(crate) version: Option<usize>,
}

impl EntityMetadata {
    /// The native kind entities of this type are stored under.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The model type this metadata was resolved for.
    pub fn entity_type_name(&self) -> &'static str {
        self.entity_type_name
    }

    /// The shape of the identifier.
    pub fn identifier_kind(&self) -> IdKind {
        self.identifier.kind
    }

    /// Whether the store may allocate the identifier.
    pub fn auto_generated(&self) -> bool {
        self.identifier.auto_generate
    }

    /// The stored name of the version property, if one is designated.
    pub fn version_property(&self) -> Option<&str> {
        self.version
            .map(|index| self.properties[index].stored_name.as_str())
    }

    /// The stored names of the directly declared properties, in marshalling
    /// order. Properties of exploded embeddeds are not included.
    pub fn stored_names(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .map(|property| property.stored_name.as_str())
    }
}

impl std::fmt::Debug for EntityMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("kind", &self.kind)
            .field("entity_type_name", &self.entity_type_name)
            .finish_non_exhaustive()
    }
}

/// Resolved identifier binding.
pub struct IdentifierMetadata {
    pub(crate) kind: IdKind,
    pub(crate) auto_generate: bool,
    pub(crate) reader: ErasedIdReader,
    pub(crate) writer: ErasedIdWriter,
}

/// Resolved key field binding.
pub struct KeyMetadata {
    pub(crate) reader: ErasedKeyReader,
    pub(crate) writer: ErasedKeyWriter,
}

/// Resolved parent key field binding.
pub struct ParentKeyMetadata {
    pub(crate) reader: ErasedKeyReader,
    pub(crate) writer: ErasedKeyWriter,
}

/// Resolved metadata for one stored property.
///
/// Kept properties always carry both accessors; bindings that lacked one
/// were filtered out or rejected during resolution.
pub struct PropertyMetadata {
    pub(crate) name: String,
    pub(crate) stored_name: String,
    pub(crate) value_type_name: &'static str,
    pub(crate) converter: ConverterRef,
    pub(crate) reader: ErasedReader,
    pub(crate) writer: ErasedWriter,
    pub(crate) indexed: bool,
    pub(crate) optional: bool,
    pub(crate) secondary_index: Option<SecondaryIndexMetadata>,
}

/// Resolved secondary index declaration.
pub(crate) struct SecondaryIndexMetadata {
    pub(crate) name: String,
    pub(crate) indexer: Arc<dyn SecondaryIndexer>,
}

/// Resolved metadata for one nested model field.
pub struct EmbeddedMetadata {
    pub(crate) name: String,
    pub(crate) stored_name: String,
    pub(crate) strategy: StorageStrategy,
    pub(crate) type_name: &'static str,
    pub(crate) construction: ConstructionSpec,
    pub(crate) properties: Vec<PropertyMetadata>,
    pub(crate) embedded: Vec<EmbeddedMetadata>,
    pub(crate) reader: ErasedReader,
    pub(crate) writer: ErasedWriter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::TEXT;
    use entimap_value::{Value, ValueKind};

    #[test]
    fn converter_ref_dispatches_to_both_forms() {
        let builtin = ConverterRef::Builtin(&TEXT);
        assert_eq!(builtin.get().native_kind(), ValueKind::Text);

        let custom = ConverterRef::Custom(Arc::new(crate::convert::TextConverter));
        let encoded = custom.get().encode(&"x".to_string()).unwrap();
        assert_eq!(encoded, Value::Text("x".to_string()));
    }
}
