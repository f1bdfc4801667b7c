//! # In-Memory Managed Provider
//!
//! Reference implementation of the [`ManagedProvider`] contract backed by
//! an in-memory map. It honors persist-then-announce trivially (the map
//! write *is* the persistence step) and is the template for providers
//! backed by real storage: replace the map operations with durable ones
//! and keep the same `Option` return shapes.

use crate::entity::Identifiable;
use crate::error::PersistError;
use crate::provider::{ManagedProvider, Provider, ProviderId};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Managed provider storing its entities in memory.
pub struct InMemoryManagedProvider<E: Identifiable> {
    id: ProviderId,
    name: String,
    store: RwLock<HashMap<E::Key, E>>,
}

impl<E: Identifiable> InMemoryManagedProvider<E> {
    pub fn new() -> Self {
        Self::with_name("in_memory_managed_provider")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            id: ProviderId::new(),
            name: name.into(),
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entities.
    pub fn stored(&self) -> usize {
        self.store.read().len()
    }
}

impl<E: Identifiable> Default for InMemoryManagedProvider<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Identifiable> Provider<E> for InMemoryManagedProvider<E> {
    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn get_all(&self) -> Vec<E> {
        self.store.read().values().cloned().collect()
    }
}

#[async_trait]
impl<E: Identifiable> ManagedProvider<E> for InMemoryManagedProvider<E> {
    async fn persist_create(&self, entity: E) -> Result<E, PersistError> {
        let key = entity.key();
        let mut store = self.store.write();
        if store.contains_key(&key) {
            return Err(PersistError::AlreadyExists {
                key: format!("{key:?}"),
            });
        }
        store.insert(key, entity.clone());
        Ok(entity)
    }

    async fn persist_update(&self, entity: E) -> Result<Option<E>, PersistError> {
        let key = entity.key();
        let mut store = self.store.write();
        if !store.contains_key(&key) {
            return Ok(None);
        }
        Ok(store.insert(key, entity))
    }

    async fn persist_delete(&self, key: &E::Key) -> Result<Option<E>, PersistError> {
        Ok(self.store.write().remove(key))
    }
}
