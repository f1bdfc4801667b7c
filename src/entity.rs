//! # Entity Identity
//!
//! The single trait an entity type must implement to live in a registry:
//! it must expose a globally unique key within its collection. Entities are
//! treated as immutable values by the registry; updates replace the whole
//! entity for a key rather than mutating it in place.

use std::fmt::Debug;
use std::hash::Hash;

/// A keyed record held in a registry's merged view.
///
/// The associated `Key` is a value type: comparable, hashable, and cheap to
/// clone. Within one merged view at most one entity is visible per key at
/// any instant.
pub trait Identifiable: Clone + Send + Sync + 'static {
    /// Key type identifying this entity within its collection.
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// The key under which this entity is registered.
    fn key(&self) -> Self::Key;
}
