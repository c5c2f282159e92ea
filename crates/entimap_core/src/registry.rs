//! Process-wide metadata cache.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::descriptor::Persistable;
use crate::error::MetadataResult;
use crate::introspect::resolve_entity;
use crate::metadata::EntityMetadata;

/// Caches resolved [`EntityMetadata`] by model type.
///
/// Resolution runs on first use of a type and the result is shared from
/// then on. Failed resolutions are never cached, so a broken descriptor
/// reports the same error on every attempt.
///
/// Resolution runs outside the lock: two threads describing the same type
/// concurrently may both build the metadata, but only the first insert is
/// kept and both callers observe the same shared instance.
#[derive(Default)]
pub struct MetadataRegistry {
    cache: RwLock<HashMap<TypeId, Arc<EntityMetadata>>>,
}

impl MetadataRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resolved metadata for `E`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::MetadataError`] when the descriptor of `E`
    /// is structurally invalid.
    pub fn describe<E: Persistable>(&self) -> MetadataResult<Arc<EntityMetadata>> {
        let type_id = TypeId::of::<E>();

        if let Some(metadata) = self.cache.read().get(&type_id) {
            return Ok(Arc::clone(metadata));
        }

        debug!("building metadata for `{}`", std::any::type_name::<E>());
        let metadata = Arc::new(resolve_entity::<E>(E::descriptor())?);

        let mut cache = self.cache.write();
        let stored = cache.entry(type_id).or_insert(metadata);
        Ok(Arc::clone(stored))
    }

    /// The number of model types resolved so far.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether no model type has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}
