//! Error types for the mapping engine.
//!
//! Three kinds of failure exist, mirroring where they arise:
//!
//! - [`MetadataError`]: a model type's registration is structurally invalid.
//!   Raised at describe-time, fatal to that type's usability, never cached.
//! - [`ConversionError`]: a single value could not be translated between its
//!   host and native representation. Value-level, context-free.
//! - [`MappingError`]: the outward-facing error of a marshal/unmarshal call,
//!   wrapping the underlying cause exactly once with the entity and field
//!   context it happened in.
//!
//! Absence of a stored property on read is not an error anywhere in this
//! module; readers tolerate it and leave fields at their defaults.

use entimap_value::{ValueError, ValueKind};
use thiserror::Error;

/// Result type for describe-time operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Result type for value-level conversions.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Result type for marshal/unmarshal calls.
pub type MappingResult<T> = Result<T, MappingError>;

/// Errors raised while resolving a model type's structural metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The type declares no identifier field.
    #[error("entity type `{entity}` declares no identifier field")]
    MissingIdentifier {
        /// The model type.
        entity: String,
    },

    /// The type declares more than one identifier field.
    #[error("entity type `{entity}` declares more than one identifier field")]
    DuplicateIdentifier {
        /// The model type.
        entity: String,
    },

    /// The type declares more than one key field.
    #[error("entity type `{entity}` declares more than one key field")]
    DuplicateKey {
        /// The model type.
        entity: String,
    },

    /// The type declares more than one parent key field.
    #[error("entity type `{entity}` declares more than one parent key field")]
    DuplicateParentKey {
        /// The model type.
        entity: String,
    },

    /// Two fields map to the same stored name.
    #[error("duplicate stored name `{name}` on `{entity}`")]
    DuplicateProperty {
        /// The owning scope (model or embedded type).
        entity: String,
        /// The colliding stored name.
        name: String,
    },

    /// An explicitly declared property is missing a reader or writer.
    #[error("explicit property `{field}` on `{entity}` has no {accessor} binding")]
    MissingAccessor {
        /// The owning scope.
        entity: String,
        /// The field name.
        field: String,
        /// Which binding is missing ("reader" or "writer").
        accessor: &'static str,
    },

    /// No converter is registered for a field's declared type.
    #[error("no converter for type `{declared}` of field `{field}` on `{entity}`")]
    UnresolvedType {
        /// The owning scope.
        entity: String,
        /// The field name.
        field: String,
        /// The declared host type.
        declared: &'static str,
    },

    /// A reader or writer binds to the wrong type.
    #[error("{accessor} of field `{field}` on `{entity}` targets `{found}`, expected `{expected}`")]
    BindingTarget {
        /// The owning scope.
        entity: String,
        /// The field name.
        field: String,
        /// Which binding is wrong ("reader" or "writer").
        accessor: &'static str,
        /// The type the binding should target.
        expected: &'static str,
        /// The type the binding actually targets.
        found: &'static str,
    },

    /// A construction descriptor produces a different type than declared.
    #[error("construction for `{entity}` produces `{found}`, expected `{expected}`")]
    WrongProduct {
        /// The model or embedded type.
        entity: String,
        /// The declared type.
        expected: &'static str,
        /// The produced type.
        found: &'static str,
    },

    /// The named version property does not exist.
    #[error("version property `{name}` is not a declared property of `{entity}`")]
    UnknownVersionProperty {
        /// The model type.
        entity: String,
        /// The stored name that was designated.
        name: String,
    },

    /// The version property does not map to an integer value.
    #[error("version property `{name}` on `{entity}` must map to an integer value")]
    VersionKind {
        /// The model type.
        entity: String,
        /// The stored name of the version property.
        name: String,
    },

    /// An operation needed a version property but the type has none.
    #[error("entity type `{entity}` has no version property")]
    MissingVersion {
        /// The model type.
        entity: String,
    },

    /// Deferred id allocation requires a numeric identifier.
    #[error("deferred id allocation is not applicable for entities with text identifiers: `{entity}`")]
    DeferredAllocation {
        /// The model type.
        entity: String,
    },
}

impl MetadataError {
    /// Creates a missing identifier error.
    pub fn missing_identifier(entity: impl Into<String>) -> Self {
        Self::MissingIdentifier {
            entity: entity.into(),
        }
    }

    /// Creates a duplicate identifier error.
    pub fn duplicate_identifier(entity: impl Into<String>) -> Self {
        Self::DuplicateIdentifier {
            entity: entity.into(),
        }
    }

    /// Creates a duplicate key error.
    pub fn duplicate_key(entity: impl Into<String>) -> Self {
        Self::DuplicateKey {
            entity: entity.into(),
        }
    }

    /// Creates a duplicate parent key error.
    pub fn duplicate_parent_key(entity: impl Into<String>) -> Self {
        Self::DuplicateParentKey {
            entity: entity.into(),
        }
    }

    /// Creates a duplicate stored name error.
    pub fn duplicate_property(entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateProperty {
            entity: entity.into(),
            name: name.into(),
        }
    }

    /// Creates a missing accessor error.
    pub fn missing_accessor(
        entity: impl Into<String>,
        field: impl Into<String>,
        accessor: &'static str,
    ) -> Self {
        Self::MissingAccessor {
            entity: entity.into(),
            field: field.into(),
            accessor,
        }
    }

    /// Creates an unresolved type error.
    pub fn unresolved_type(
        entity: impl Into<String>,
        field: impl Into<String>,
        declared: &'static str,
    ) -> Self {
        Self::UnresolvedType {
            entity: entity.into(),
            field: field.into(),
            declared,
        }
    }

    /// Creates a binding target error.
    pub fn binding_target(
        entity: impl Into<String>,
        field: impl Into<String>,
        accessor: &'static str,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::BindingTarget {
            entity: entity.into(),
            field: field.into(),
            accessor,
            expected,
            found,
        }
    }

    /// Creates a wrong construction product error.
    pub fn wrong_product(
        entity: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::WrongProduct {
            entity: entity.into(),
            expected,
            found,
        }
    }

    /// Creates an unknown version property error.
    pub fn unknown_version_property(entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownVersionProperty {
            entity: entity.into(),
            name: name.into(),
        }
    }

    /// Creates a version kind error.
    pub fn version_kind(entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self::VersionKind {
            entity: entity.into(),
            name: name.into(),
        }
    }

    /// Creates a missing version error.
    pub fn missing_version(entity: impl Into<String>) -> Self {
        Self::MissingVersion {
            entity: entity.into(),
        }
    }

    /// Creates a deferred allocation error.
    pub fn deferred_allocation(entity: impl Into<String>) -> Self {
        Self::DeferredAllocation {
            entity: entity.into(),
        }
    }
}

/// Errors raised while translating one value between representations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The native value has a different kind than the converter handles.
    #[error("expecting {expected}, but found {found}")]
    UnexpectedKind {
        /// The kind the converter handles.
        expected: ValueKind,
        /// The kind actually found.
        found: ValueKind,
    },

    /// A stored integer does not fit the narrower host type.
    #[error("value {value} is out of range for {target}")]
    OutOfRange {
        /// The stored value.
        value: i64,
        /// The host type it was being narrowed to.
        target: &'static str,
    },

    /// A container holds an element kind no converter supports.
    #[error("unsupported type {kind} in {container}")]
    UnsupportedElement {
        /// The unsupported element kind.
        kind: ValueKind,
        /// The container kind ("list" or "set").
        container: &'static str,
    },

    /// A host value is not the Rust type the binding was declared with.
    #[error("expecting a host value of type `{expected}`")]
    HostType {
        /// The expected Rust type.
        expected: &'static str,
    },

    /// Null arrived where a non-nullable binding needs a value.
    #[error("null value where a non-nullable value was expected")]
    UnexpectedNull,

    /// A stored timestamp cannot be expanded to a datetime.
    #[error(transparent)]
    Timestamp(#[from] ValueError),
}

impl ConversionError {
    /// Creates an unexpected kind error.
    pub fn unexpected_kind(expected: ValueKind, found: ValueKind) -> Self {
        Self::UnexpectedKind { expected, found }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(value: i64, target: &'static str) -> Self {
        Self::OutOfRange { value, target }
    }

    /// Creates an unsupported element error.
    pub fn unsupported_element(kind: ValueKind, container: &'static str) -> Self {
        Self::UnsupportedElement { kind, container }
    }

    /// Creates a host type error.
    pub fn host_type(expected: &'static str) -> Self {
        Self::HostType { expected }
    }
}

/// Errors raised by a marshal or unmarshal call.
///
/// Every variant carries the model context and, where one exists, the
/// underlying [`ConversionError`] as its source. Causes are wrapped exactly
/// once: the walk attaches context at the point of failure and everything
/// above propagates unchanged.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The type's metadata could not be built.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Converting one property failed.
    #[error("failed to map property `{property}` of `{entity}`")]
    Property {
        /// The owning scope (model or embedded type).
        entity: String,
        /// The stored name of the property.
        property: String,
        /// The underlying conversion failure.
        #[source]
        source: ConversionError,
    },

    /// Reading or writing the identifier failed.
    #[error("failed to map the identifier of `{entity}`")]
    Identifier {
        /// The model type.
        entity: String,
        /// The underlying conversion failure.
        #[source]
        source: ConversionError,
    },

    /// Reading or writing the key or parent key failed.
    #[error("failed to map the key of `{entity}`")]
    Key {
        /// The model type.
        entity: String,
        /// The underlying conversion failure.
        #[source]
        source: ConversionError,
    },

    /// Instantiating or finalizing an instance failed.
    #[error("failed to construct an instance of `{entity}`")]
    Construction {
        /// The model or embedded type.
        entity: String,
        /// The underlying conversion failure.
        #[source]
        source: ConversionError,
    },

    /// An operation required a property the native entity does not have.
    #[error("native entity has no property `{property}` required by `{entity}`")]
    MissingProperty {
        /// The model type.
        entity: String,
        /// The absent stored name.
        property: String,
    },
}

impl MappingError {
    /// Creates a property mapping error.
    pub fn property(
        entity: impl Into<String>,
        property: impl Into<String>,
        source: ConversionError,
    ) -> Self {
        Self::Property {
            entity: entity.into(),
            property: property.into(),
            source,
        }
    }

    /// Creates an identifier mapping error.
    pub fn identifier(entity: impl Into<String>, source: ConversionError) -> Self {
        Self::Identifier {
            entity: entity.into(),
            source,
        }
    }

    /// Creates a key mapping error.
    pub fn key(entity: impl Into<String>, source: ConversionError) -> Self {
        Self::Key {
            entity: entity.into(),
            source,
        }
    }

    /// Creates a construction error.
    pub fn construction(entity: impl Into<String>, source: ConversionError) -> Self {
        Self::Construction {
            entity: entity.into(),
            source,
        }
    }

    /// Creates a missing property error.
    pub fn missing_property(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MissingProperty {
            entity: entity.into(),
            property: property.into(),
        }
    }
}
