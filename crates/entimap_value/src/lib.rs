//! # EntiMap Value Model
//!
//! The native value, key, and entity model of the document store that
//! EntiMap maps objects to and from.
//!
//! This crate defines:
//! - [`Value`]: the tagged-union value type (null, boolean, integer, double,
//!   text, bytes, timestamp, key reference, list, nested entity)
//! - [`ValueKind`]: value kinds, with their index-exclusion capability
//! - [`Timestamp`]: microsecond-precision instants with chrono conversions
//! - [`Key`] / [`KeyId`]: path-qualified keys with identity and ancestry
//! - [`Entity`] / [`Property`] / [`EntityBuilder`]: ordered property bags
//!   with presence checks and copy-on-build construction
//!
//! The mapping engine lives in `entimap_core`; nothing here performs I/O or
//! talks to a store.
//!
//! ## Example
//!
//! ```rust
//! use entimap_value::{Entity, Key, Value};
//!
//! let entity = Entity::builder()
//!     .key(Key::numeric("User", 42))
//!     .set("name", "Alice")
//!     .set("age", 30i64)
//!     .build();
//!
//! assert!(entity.contains("name"));
//! assert_eq!(entity.get("age"), Some(&Value::Integer(30)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod entity;
pub mod error;
pub mod key;
pub mod timestamp;
pub mod value;

pub use entity::{Entity, EntityBuilder, Property};
pub use error::{ValueError, ValueResult};
pub use key::{Key, KeyId};
pub use timestamp::Timestamp;
pub use value::{Value, ValueKind};
