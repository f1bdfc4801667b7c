//! # Change Listener Contract
//!
//! Observers of merged-view mutations. Listeners are invoked synchronously
//! on the mutating caller's task, after the merged view has been updated,
//! in registration order. A failing listener is logged and isolated; it
//! never prevents delivery to subsequent listeners and never corrupts
//! registry state.
//!
//! Listeners must not mutate the registry from within a callback (the
//! mutation path is serialized and not reentrant); reads are allowed.

use crate::entity::Identifiable;
use async_trait::async_trait;
use std::fmt;

/// Boxed error returned by listener callbacks.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// An observer notified of add/update/remove events on the merged view.
///
/// All callbacks default to no-ops so implementations only handle the
/// transitions they care about.
#[async_trait]
pub trait RegistryChangeListener<E: Identifiable>: Send + Sync {
    /// An entity became visible under a previously absent key.
    async fn entity_added(&self, _entity: &E) -> Result<(), ListenerError> {
        Ok(())
    }

    /// The visible entity for a key was replaced; `old` carries the prior
    /// value so listeners can diff.
    async fn entity_updated(&self, _old: &E, _new: &E) -> Result<(), ListenerError> {
        Ok(())
    }

    /// The last owner of a key retracted it; the key is gone from the view.
    async fn entity_removed(&self, _entity: &E) -> Result<(), ListenerError> {
        Ok(())
    }

    /// Listener name for logs and diagnostics.
    fn listener_name(&self) -> &str {
        "unnamed_listener"
    }
}

/// Handle returned by listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// A single merged-view mutation, in the order it was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryChange<E: Identifiable> {
    Added(E),
    Updated { old: E, new: E },
    Removed(E),
}

impl<E: Identifiable> RegistryChange<E> {
    /// Key of the entity this change affects.
    pub fn key(&self) -> E::Key {
        match self {
            RegistryChange::Added(entity) => entity.key(),
            RegistryChange::Updated { new, .. } => new.key(),
            RegistryChange::Removed(entity) => entity.key(),
        }
    }
}
