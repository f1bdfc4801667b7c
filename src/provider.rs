//! # Provider Capability Contracts
//!
//! A provider contributes a subset of entities to a registry and reports
//! add/update/remove changes to its subset while bound. Zero or more
//! providers may be bound at any time; at most one of them is the managed
//! provider, which additionally accepts external write requests and is
//! responsible for durability.
//!
//! ## Contract
//!
//! - `get_all()` is called once, at bind time, for a full snapshot ingest.
//!   It may be called again if the registry needs to resynchronize.
//! - After bind and before unbind, a provider reports changes to its own
//!   contributed set through the registry's `added`/`updated`/`removed`
//!   methods, naming itself by its [`ProviderId`]. It must not report
//!   changes after it has been unbound.
//! - A managed provider must durably persist a write before it is announced
//!   to listeners. The registry performs the announce step itself, after the
//!   `persist_*` call returns `Ok` (see the aggregator module docs).

use crate::entity::Identifiable;
use crate::error::PersistError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a provider instance.
///
/// Identity is per instance, not per type: two providers of the same kind
/// bound at the same time have distinct ids. The id is generated at
/// construction time and must stay stable for the lifetime of the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(Uuid);

impl ProviderId {
    /// Generate a fresh provider identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source contributing a subset of entities to a registry.
#[async_trait]
pub trait Provider<E: Identifiable>: Send + Sync {
    /// Stable identity of this provider instance.
    fn provider_id(&self) -> ProviderId;

    /// Human-readable name for logs and diagnostics.
    fn provider_name(&self) -> &str {
        "unnamed_provider"
    }

    /// Full enumeration of the entities this provider currently supplies.
    async fn get_all(&self) -> Vec<E>;
}

/// The single provider authorized to accept and persist external writes.
///
/// Each `persist_*` operation must durably store the change before
/// returning `Ok`; announcing state that a crash could lose is not allowed.
/// The `Option` returns carry the "did the key exist" signal the registry
/// needs to treat writes against absent keys as logged no-ops instead of
/// failures.
#[async_trait]
pub trait ManagedProvider<E: Identifiable>: Provider<E> {
    /// Durably store a new entity. Fails with
    /// [`PersistError::AlreadyExists`] if the key is already stored.
    async fn persist_create(&self, entity: E) -> Result<E, PersistError>;

    /// Durably replace a stored entity, returning the prior value, or
    /// `Ok(None)` if the key is not stored.
    async fn persist_update(&self, entity: E) -> Result<Option<E>, PersistError>;

    /// Durably remove a stored entity, returning the removed value, or
    /// `Ok(None)` if the key is not stored.
    async fn persist_delete(&self, key: &E::Key) -> Result<Option<E>, PersistError>;
}
