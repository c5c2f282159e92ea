//! # EntiMap Core
//!
//! Metadata-driven mapping between typed model objects and native document
//! store entities.
//!
//! This crate provides:
//! - Declarative descriptors binding model fields through plain closures
//! - One-time introspection with structural validation and caching
//! - Bidirectional marshalling, including nested models and collections
//! - Pluggable per-field value converters and secondary indexes
//! - Direct and builder-based instance construction
//!
//! ## Mapping Model
//!
//! Model types implement [`Persistable`] by returning an
//! [`EntityDescriptor`]. The [`MetadataRegistry`] resolves each descriptor
//! once into validated metadata; [`Mapper`] then walks that metadata to
//! translate instances in either direction. No mapping work recurs per
//! call beyond the field reads and conversions themselves.
//!
//! ## Example
//!
//! ```
//! use entimap_core::{EntityDescriptor, IdField, Mapper, Persistable, PropertyField};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Book {
//!     id: Option<i64>,
//!     title: String,
//!     pages: i32,
//! }
//!
//! impl Persistable for Book {
//!     fn descriptor() -> EntityDescriptor {
//!         EntityDescriptor::direct::<Book>("Book")
//!             .id(IdField::new(|b: &Book| b.id, |b: &mut Book, id: i64| {
//!                 b.id = Some(id);
//!             })
//!             .auto_generated())
//!             .field(PropertyField::new(
//!                 "title",
//!                 |b: &Book| b.title.clone(),
//!                 |b: &mut Book, v: String| b.title = v,
//!             ))
//!             .field(PropertyField::new(
//!                 "pages",
//!                 |b: &Book| b.pages,
//!                 |b: &mut Book, v: i32| b.pages = v,
//!             ))
//!     }
//! }
//!
//! let mapper = Mapper::default();
//! let book = Book { id: Some(7), title: "Dune".to_string(), pages: 412 };
//!
//! let native = mapper.marshal(&book).unwrap();
//! assert_eq!(native.key().unwrap().kind(), "Book");
//!
//! let back: Book = mapper.unmarshal(&native).unwrap();
//! assert_eq!(back, book);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod convert;
pub mod descriptor;
pub mod error;
pub mod index;
pub mod mapper;
pub mod metadata;
pub mod registry;

mod introspect;
mod marshal;
mod unmarshal;

pub use convert::{IdKind, IdentifierValue, ValueConverter};
pub use descriptor::{
    Embeddable, EmbeddedDescriptor, EmbeddedField, EntityDescriptor, IdField, KeyField,
    ParentKeyField, Persistable, PropertyField, StorageStrategy,
};
pub use error::{
    ConversionError, ConversionResult, MappingError, MappingResult, MetadataError, MetadataResult,
};
pub use index::{LowercaseIndexer, SecondaryIndexer};
pub use mapper::Mapper;
pub use metadata::EntityMetadata;
pub use registry::MetadataRegistry;
