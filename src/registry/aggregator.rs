//! # Aggregating Registry
//!
//! Thread-safe merged view over all bound providers, with deterministic
//! collision precedence and live change notification.
//!
//! ## Overview
//!
//! Providers bind and unbind at arbitrary times; each contributes a subset
//! of entities. The registry keeps one visible entity per key, tracks which
//! providers currently supply each key, and notifies registered listeners
//! of every accepted mutation. External writes are routed to the managed
//! provider, persisted there, and only then announced through the same
//! provider-event path that every other mutation takes.
//!
//! ## Precedence
//!
//! When several providers supply the same key, the entity from the
//! most-recently-bound provider is visible; every owner is retained in the
//! per-key slot so that unbinding one provider does not erase an entity
//! still supplied by another. A key leaves the merged view only when its
//! last owner retracts it or unbinds.
//!
//! ## Locking
//!
//! One coarse read/write lock guards the merged view and the ownership
//! index together; readers take it only for the duration of the map access
//! and never observe a torn state. A separate mutation gate serializes
//! structural mutations *and* their listener dispatch, so notification
//! order matches mutation order. No lock is held across provider I/O or
//! listener callbacks.

use crate::config::RegistryConfig;
use crate::entity::Identifiable;
use crate::error::{RegistryError, Result};
use crate::events::publisher::EventPublisher;
use crate::events::sink::EventBusSink;
use crate::provider::{ManagedProvider, Provider, ProviderId};
use crate::readiness::ReadinessTracker;
use crate::registry::listener::{ListenerId, RegistryChange, RegistryChangeListener};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Registration record for one bound provider.
struct ProviderRecord<E: Identifiable> {
    name: String,
    /// Monotonic bind order; larger wins collision precedence.
    bind_seq: u64,
    handle: Arc<dyn Provider<E>>,
    /// Keys currently contributed by this provider.
    keys: HashSet<E::Key>,
}

/// One provider's contribution to a key slot.
struct OwnerEntry<E: Identifiable> {
    provider: ProviderId,
    bind_seq: u64,
    entity: E,
}

#[derive(Clone)]
struct ManagedRecord<E: Identifiable> {
    id: ProviderId,
    handle: Arc<dyn ManagedProvider<E>>,
}

/// Shared mutable state: merged view plus ownership index.
struct AggregatorState<E: Identifiable> {
    providers: HashMap<ProviderId, ProviderRecord<E>>,
    /// Per-key owner entries, ascending by bind sequence; last is visible.
    entries: HashMap<E::Key, Vec<OwnerEntry<E>>>,
    managed: Option<ManagedRecord<E>>,
    next_bind_seq: u64,
    serving: bool,
}

impl<E: Identifiable> AggregatorState<E> {
    fn new() -> Self {
        Self {
            providers: HashMap::new(),
            entries: HashMap::new(),
            managed: None,
            next_bind_seq: 0,
            serving: false,
        }
    }
}

/// Outcome of applying one provider change report against the state.
enum Applied<E: Identifiable> {
    /// The visible view changed; listeners must be notified.
    Notify(RegistryChange<E>),
    /// Ownership changed in a shadowed layer; the visible view is untouched.
    Silent,
    /// The acting provider does not own the key; logged no-op.
    NotOwned,
}

struct ListenerEntry<E: Identifiable> {
    id: ListenerId,
    listener: Arc<dyn RegistryChangeListener<E>>,
}

impl<E: Identifiable> Clone for ListenerEntry<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: self.listener.clone(),
        }
    }
}

/// Statistics about a registry instance
#[derive(Debug, Clone)]
pub struct AggregatorStats {
    pub total_entities: usize,
    pub total_providers: usize,
    pub managed_provider_bound: bool,
    pub total_listeners: usize,
    pub events_dispatched: u64,
    pub serving: bool,
}

/// Merged, queryable view over all bound providers.
pub struct AggregatingRegistry<E: Identifiable> {
    config: RegistryConfig,
    state: RwLock<AggregatorState<E>>,
    /// Serializes structural mutations and their notification dispatch.
    mutation_gate: Mutex<()>,
    listeners: RwLock<Vec<ListenerEntry<E>>>,
    next_listener_id: AtomicU64,
    events_dispatched: AtomicU64,
    readiness: Option<Arc<dyn ReadinessTracker>>,
}

impl<E: Identifiable> AggregatingRegistry<E> {
    /// Create a new registry with the given configuration.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            state: RwLock::new(AggregatorState::new()),
            mutation_gate: Mutex::new(()),
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            events_dispatched: AtomicU64::new(0),
            readiness: None,
        }
    }

    /// Inject the readiness tracker notified on start and shutdown.
    pub fn with_readiness_tracker(mut self, tracker: Arc<dyn ReadinessTracker>) -> Self {
        self.readiness = Some(tracker);
        self
    }

    /// The configuration this registry was constructed with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Look up the visible entity for a key. Never blocks on provider I/O.
    pub fn get(&self, key: &E::Key) -> Option<E> {
        self.state
            .read()
            .entries
            .get(key)
            .and_then(|slot| slot.last())
            .map(|owner| owner.entity.clone())
    }

    /// Snapshot of every visible entity. Copy-on-read: the returned
    /// collection is isolated from subsequent mutations.
    pub fn all(&self) -> Vec<E> {
        self.state
            .read()
            .entries
            .values()
            .filter_map(|slot| slot.last())
            .map(|owner| owner.entity.clone())
            .collect()
    }

    /// Number of visible entities in the merged view.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Whether a managed provider is currently bound.
    pub fn has_managed_provider(&self) -> bool {
        self.state.read().managed.is_some()
    }

    /// Get registry statistics
    pub fn stats(&self) -> AggregatorStats {
        let state = self.state.read();
        AggregatorStats {
            total_entities: state.entries.len(),
            total_providers: state.providers.len(),
            managed_provider_bound: state.managed.is_some(),
            total_listeners: self.listeners.read().len(),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            serving: state.serving,
        }
    }

    // ------------------------------------------------------------------
    // Provider-facing change reports
    // ------------------------------------------------------------------

    /// A bound provider reports a new entity in its contributed set.
    ///
    /// Idempotent: reporting a key the provider already owns behaves as
    /// [`updated`](Self::updated).
    pub async fn added(&self, provider: &ProviderId, entity: E) -> Result<()> {
        let _gate = self.mutation_gate.lock().await;
        let applied = {
            let mut state = self.state.write();
            Self::apply_added(&mut state, provider, entity)
        };
        self.finish_change("added", provider, applied).await
    }

    /// A bound provider reports a changed entity in its contributed set.
    ///
    /// Reporting a key the provider does not own is a logged no-op.
    pub async fn updated(&self, provider: &ProviderId, entity: E) -> Result<()> {
        let _gate = self.mutation_gate.lock().await;
        let applied = {
            let mut state = self.state.write();
            Self::apply_updated(&mut state, provider, entity)
        };
        self.finish_change("updated", provider, applied).await
    }

    /// A bound provider retracts a key from its contributed set.
    ///
    /// Retracting a key the provider does not own is a logged no-op.
    pub async fn removed(&self, provider: &ProviderId, key: &E::Key) -> Result<()> {
        let _gate = self.mutation_gate.lock().await;
        let applied = {
            let mut state = self.state.write();
            Self::apply_removed(&mut state, provider, key)
        };
        self.finish_change("removed", provider, applied).await
    }

    async fn finish_change(
        &self,
        operation: &str,
        provider: &ProviderId,
        applied: Result<Applied<E>>,
    ) -> Result<()> {
        match applied {
            Ok(Applied::Notify(change)) => {
                self.dispatch(vec![change]).await;
                Ok(())
            }
            Ok(Applied::Silent) => Ok(()),
            Ok(Applied::NotOwned) => {
                warn!(
                    collection = %self.config.collection,
                    provider_id = %provider,
                    operation = %operation,
                    "change report for a key the provider does not own, ignoring"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    collection = %self.config.collection,
                    provider_id = %provider,
                    operation = %operation,
                    error = %err,
                    "change report rejected"
                );
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // External write API
    // ------------------------------------------------------------------

    /// Create an entity through the managed provider.
    ///
    /// The entity is durably persisted first; on success it is announced
    /// through the provider-facing `added` path, so exactly one `added`
    /// notification is delivered before this call returns. On persistence
    /// failure the merged view is left unchanged.
    pub async fn create(&self, entity: E) -> Result<E> {
        let managed = self.managed_record().ok_or(RegistryError::NotManaged)?;
        let stored = managed.handle.persist_create(entity).await?;
        self.added(&managed.id, stored.clone()).await?;
        Ok(stored)
    }

    /// Update an entity through the managed provider.
    ///
    /// Updating a key the managed provider does not store is a logged
    /// no-op: the entity is returned unchanged and no notification fires.
    pub async fn update(&self, entity: E) -> Result<E> {
        let managed = self.managed_record().ok_or(RegistryError::NotManaged)?;
        match managed.handle.persist_update(entity.clone()).await? {
            Some(_prior) => {
                self.updated(&managed.id, entity.clone()).await?;
                Ok(entity)
            }
            None => {
                warn!(
                    collection = %self.config.collection,
                    key = ?entity.key(),
                    "update ignored: no managed entry for key"
                );
                Ok(entity)
            }
        }
    }

    /// Delete an entity through the managed provider.
    ///
    /// Idempotent: deleting a key the managed provider does not store
    /// succeeds without a notification.
    pub async fn delete(&self, key: &E::Key) -> Result<()> {
        let managed = self.managed_record().ok_or(RegistryError::NotManaged)?;
        match managed.handle.persist_delete(key).await? {
            Some(_removed) => self.removed(&managed.id, key).await,
            None => {
                debug!(
                    collection = %self.config.collection,
                    key = ?key,
                    "delete ignored: no managed entry for key"
                );
                Ok(())
            }
        }
    }

    fn managed_record(&self) -> Option<ManagedRecord<E>> {
        self.state.read().managed.clone()
    }

    // ------------------------------------------------------------------
    // Provider lifecycle
    // ------------------------------------------------------------------

    /// Bind a provider and ingest its full snapshot.
    ///
    /// The snapshot is merged atomically with respect to readers; listener
    /// notifications are delivered per entity once the view is updated.
    pub async fn add_provider<P>(&self, provider: Arc<P>) -> Result<()>
    where
        P: Provider<E> + 'static,
    {
        self.bind_provider(provider, None).await
    }

    /// Bind the managed provider. At most one may be bound at a time.
    pub async fn add_managed_provider<P>(&self, provider: Arc<P>) -> Result<()>
    where
        P: ManagedProvider<E> + 'static,
    {
        let managed: Arc<dyn ManagedProvider<E>> = provider.clone();
        self.bind_provider(provider, Some(managed)).await
    }

    async fn bind_provider<P>(
        &self,
        provider: Arc<P>,
        managed: Option<Arc<dyn ManagedProvider<E>>>,
    ) -> Result<()>
    where
        P: Provider<E> + 'static,
    {
        let id = provider.provider_id();
        let name = provider.provider_name().to_string();

        // Full enumeration happens before any lock is taken: provider I/O
        // must never block readers.
        let snapshot = provider.get_all().await;
        let snapshot_size = snapshot.len();

        let _gate = self.mutation_gate.lock().await;
        let changes = {
            let mut state = self.state.write();
            if state.providers.contains_key(&id) {
                warn!(
                    collection = %self.config.collection,
                    provider_id = %id,
                    provider = %name,
                    "provider is already bound, rejecting bind"
                );
                return Err(RegistryError::ProviderAlreadyBound(id));
            }
            if managed.is_some() {
                if let Some(existing) = &state.managed {
                    warn!(
                        collection = %self.config.collection,
                        provider_id = %id,
                        existing = %existing.id,
                        "a managed provider is already bound, rejecting bind"
                    );
                    return Err(RegistryError::ManagedAlreadyBound(existing.id));
                }
            }

            let bind_seq = state.next_bind_seq;
            state.next_bind_seq += 1;
            let handle: Arc<dyn Provider<E>> = provider.clone();
            state.providers.insert(
                id,
                ProviderRecord {
                    name: name.clone(),
                    bind_seq,
                    handle,
                    keys: HashSet::new(),
                },
            );
            if let Some(handle) = managed {
                state.managed = Some(ManagedRecord { id, handle });
            }

            let mut changes = Vec::new();
            for entity in snapshot {
                match Self::apply_added(&mut state, &id, entity) {
                    Ok(Applied::Notify(change)) => changes.push(change),
                    Ok(_) => {}
                    Err(err) => {
                        // the provider record was just inserted, so this
                        // only fires on a corrupted snapshot entry
                        warn!(
                            collection = %self.config.collection,
                            provider_id = %id,
                            error = %err,
                            "snapshot entry rejected during ingest"
                        );
                    }
                }
            }
            changes
        };

        info!(
            collection = %self.config.collection,
            provider_id = %id,
            provider = %name,
            entities = snapshot_size,
            managed = self.has_managed_provider() && self.is_managed(&id),
            "provider bound"
        );
        self.dispatch(changes).await;
        Ok(())
    }

    fn is_managed(&self, id: &ProviderId) -> bool {
        self.state
            .read()
            .managed
            .as_ref()
            .map(|m| m.id == *id)
            .unwrap_or(false)
    }

    /// Re-enumerate a bound provider and reconcile its contributed set:
    /// entities in the fresh snapshot are merged through the `added` path,
    /// keys the provider no longer reports are retracted.
    pub async fn resync_provider(&self, provider: &ProviderId) -> Result<()> {
        let handle = {
            let state = self.state.read();
            let record = state
                .providers
                .get(provider)
                .ok_or(RegistryError::UnknownProvider(*provider))?;
            record.handle.clone()
        };
        let snapshot = handle.get_all().await;

        let _gate = self.mutation_gate.lock().await;
        let changes = {
            let mut state = self.state.write();
            // the provider may have unbound while we enumerated
            let Some(record) = state.providers.get(provider) else {
                return Err(RegistryError::UnknownProvider(*provider));
            };
            let mut stale: HashSet<E::Key> = record.keys.clone();

            let mut changes = Vec::new();
            for entity in snapshot {
                stale.remove(&entity.key());
                if let Ok(Applied::Notify(change)) = Self::apply_added(&mut state, provider, entity)
                {
                    changes.push(change);
                }
            }
            for key in &stale {
                if let Ok(Applied::Notify(change)) = Self::apply_removed(&mut state, provider, key)
                {
                    changes.push(change);
                }
            }
            changes
        };

        debug!(
            collection = %self.config.collection,
            provider_id = %provider,
            changes = changes.len(),
            "provider resynchronized"
        );
        self.dispatch(changes).await;
        Ok(())
    }

    /// Unbind a provider, retracting every key it still solely owns.
    pub async fn remove_provider(&self, provider: &ProviderId) -> Result<()> {
        let _gate = self.mutation_gate.lock().await;
        let (name, changes) = {
            let mut state = self.state.write();
            let Some(record) = state.providers.get(provider) else {
                warn!(
                    collection = %self.config.collection,
                    provider_id = %provider,
                    "unknown provider, ignoring unbind"
                );
                return Err(RegistryError::UnknownProvider(*provider));
            };
            let name = record.name.clone();
            let keys: Vec<E::Key> = record.keys.iter().cloned().collect();

            let mut changes = Vec::new();
            for key in &keys {
                if let Ok(Applied::Notify(change)) = Self::apply_removed(&mut state, provider, key)
                {
                    changes.push(change);
                }
            }
            state.providers.remove(provider);
            if state.managed.as_ref().map(|m| m.id) == Some(*provider) {
                state.managed = None;
            }
            (name, changes)
        };

        info!(
            collection = %self.config.collection,
            provider_id = %provider,
            provider = %name,
            retracted = changes.len(),
            "provider unbound"
        );
        self.dispatch(changes).await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Listener management
    // ------------------------------------------------------------------

    /// Register a change listener. Delivery order across listeners is
    /// registration order.
    pub fn add_change_listener(&self, listener: Arc<dyn RegistryChangeListener<E>>) -> ListenerId {
        let id = ListenerId::new(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        debug!(
            collection = %self.config.collection,
            listener_id = %id,
            listener = listener.listener_name(),
            "registry change listener registered"
        );
        self.listeners.write().push(ListenerEntry { id, listener });
        id
    }

    /// Unregister a change listener. Returns whether it was registered.
    /// A listener unregistered mid-batch receives no further notifications
    /// from that batch.
    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        let removed = listeners.len() != before;
        if removed {
            debug!(
                collection = %self.config.collection,
                listener_id = %id,
                "registry change listener unregistered"
            );
        }
        removed
    }

    async fn dispatch(&self, changes: Vec<RegistryChange<E>>) {
        for change in changes {
            // fresh snapshot of the listener table per event, so listeners
            // unregistered mid-batch stop receiving immediately and ones
            // registered mid-batch start
            let listeners: Vec<ListenerEntry<E>> = self.listeners.read().clone();
            for entry in &listeners {
                let result = match &change {
                    RegistryChange::Added(entity) => entry.listener.entity_added(entity).await,
                    RegistryChange::Updated { old, new } => {
                        entry.listener.entity_updated(old, new).await
                    }
                    RegistryChange::Removed(entity) => entry.listener.entity_removed(entity).await,
                };
                if let Err(err) = result {
                    error!(
                        collection = %self.config.collection,
                        listener_id = %entry.id,
                        listener = entry.listener.listener_name(),
                        error = %err,
                        "registry change listener failed"
                    );
                }
            }
            self.events_dispatched.fetch_add(1, Ordering::Relaxed);
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle / readiness
    // ------------------------------------------------------------------

    /// Transition to serving and report readiness. Idempotent.
    ///
    /// Embedders call this after the binding mechanism has bound the
    /// initial provider set, so dependents gating on readiness observe a
    /// fully ingested view.
    pub async fn start(&self) {
        {
            let mut state = self.state.write();
            if state.serving {
                return;
            }
            state.serving = true;
        }
        if let Some(tracker) = &self.readiness {
            tracker.mark_ready(&self.config.readiness.topic).await;
        }
        info!(
            collection = %self.config.collection,
            topic = %self.config.readiness.topic,
            "registry serving"
        );
    }

    /// Report not-ready and drop all provider records and listeners.
    ///
    /// Teardown is silent: no per-entity notifications fire for the
    /// discarded view.
    pub async fn shutdown(&self) {
        let was_serving = {
            let mut state = self.state.write();
            let was = state.serving;
            state.serving = false;
            was
        };
        if was_serving {
            if let Some(tracker) = &self.readiness {
                tracker.mark_not_ready(&self.config.readiness.topic).await;
            }
        }

        let _gate = self.mutation_gate.lock().await;
        {
            let mut state = self.state.write();
            state.providers.clear();
            state.entries.clear();
            state.managed = None;
        }
        self.listeners.write().clear();
        info!(collection = %self.config.collection, "registry stopped");
    }

    // ------------------------------------------------------------------
    // State transitions (pure, called with the state lock held)
    // ------------------------------------------------------------------

    fn apply_added(
        state: &mut AggregatorState<E>,
        provider: &ProviderId,
        entity: E,
    ) -> Result<Applied<E>> {
        let record = state
            .providers
            .get_mut(provider)
            .ok_or(RegistryError::UnknownProvider(*provider))?;
        let bind_seq = record.bind_seq;
        let key = entity.key();
        let slot = state.entries.entry(key.clone()).or_default();

        if let Some(pos) = slot.iter().position(|owner| owner.provider == *provider) {
            // idempotent add: the provider already owns this key
            let old = std::mem::replace(&mut slot[pos].entity, entity.clone());
            return Ok(if pos == slot.len() - 1 {
                Applied::Notify(RegistryChange::Updated { old, new: entity })
            } else {
                Applied::Silent
            });
        }

        let prior_visible = slot.last().map(|owner| owner.entity.clone());
        let pos = slot
            .iter()
            .position(|owner| owner.bind_seq > bind_seq)
            .unwrap_or(slot.len());
        slot.insert(
            pos,
            OwnerEntry {
                provider: *provider,
                bind_seq,
                entity: entity.clone(),
            },
        );
        record.keys.insert(key);

        Ok(if pos == slot.len() - 1 {
            match prior_visible {
                None => Applied::Notify(RegistryChange::Added(entity)),
                Some(old) => Applied::Notify(RegistryChange::Updated { old, new: entity }),
            }
        } else {
            Applied::Silent
        })
    }

    fn apply_updated(
        state: &mut AggregatorState<E>,
        provider: &ProviderId,
        entity: E,
    ) -> Result<Applied<E>> {
        if !state.providers.contains_key(provider) {
            return Err(RegistryError::UnknownProvider(*provider));
        }
        let key = entity.key();
        let Some(slot) = state.entries.get_mut(&key) else {
            return Ok(Applied::NotOwned);
        };
        let Some(pos) = slot.iter().position(|owner| owner.provider == *provider) else {
            return Ok(Applied::NotOwned);
        };
        let old = std::mem::replace(&mut slot[pos].entity, entity.clone());
        Ok(if pos == slot.len() - 1 {
            Applied::Notify(RegistryChange::Updated { old, new: entity })
        } else {
            Applied::Silent
        })
    }

    fn apply_removed(
        state: &mut AggregatorState<E>,
        provider: &ProviderId,
        key: &E::Key,
    ) -> Result<Applied<E>> {
        let record = state
            .providers
            .get_mut(provider)
            .ok_or(RegistryError::UnknownProvider(*provider))?;
        let Some(slot) = state.entries.get_mut(key) else {
            return Ok(Applied::NotOwned);
        };
        let Some(pos) = slot.iter().position(|owner| owner.provider == *provider) else {
            return Ok(Applied::NotOwned);
        };

        let was_visible = pos == slot.len() - 1;
        let removed = slot.remove(pos);
        let now_empty = slot.is_empty();
        let next_visible = slot.last().map(|owner| owner.entity.clone());
        record.keys.remove(key);

        if now_empty {
            state.entries.remove(key);
            return Ok(Applied::Notify(RegistryChange::Removed(removed.entity)));
        }
        Ok(match (was_visible, next_visible) {
            (true, Some(new)) => Applied::Notify(RegistryChange::Updated {
                old: removed.entity,
                new,
            }),
            _ => Applied::Silent,
        })
    }
}

impl<E> AggregatingRegistry<E>
where
    E: Identifiable + Serialize,
    E::Key: Display,
{
    /// Inject an event bus publisher: every accepted change is serialized
    /// into an envelope and published, via an [`EventBusSink`] registered
    /// as the first listener.
    pub fn with_event_publisher(self, publisher: EventPublisher) -> Self {
        let sink = EventBusSink::new(publisher, self.config.collection.clone());
        self.add_change_listener(Arc::new(sink));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::memory::InMemoryManagedProvider;
    use async_trait::async_trait;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: String,
        label: String,
    }

    impl Identifiable for Item {
        type Key = String;

        fn key(&self) -> String {
            self.name.clone()
        }
    }

    fn item(name: &str, label: &str) -> Item {
        Item {
            name: name.to_string(),
            label: label.to_string(),
        }
    }

    /// Provider with a fixed snapshot, reporting changes through the
    /// registry's provider-facing methods in tests.
    struct StaticProvider {
        id: ProviderId,
        name: String,
        items: Vec<Item>,
    }

    impl StaticProvider {
        fn new(name: &str, items: Vec<Item>) -> Self {
            Self {
                id: ProviderId::new(),
                name: name.to_string(),
                items,
            }
        }
    }

    #[async_trait]
    impl Provider<Item> for StaticProvider {
        fn provider_id(&self) -> ProviderId {
            self.id
        }

        fn provider_name(&self) -> &str {
            &self.name
        }

        async fn get_all(&self) -> Vec<Item> {
            self.items.clone()
        }
    }

    fn registry() -> AggregatingRegistry<Item> {
        AggregatingRegistry::new(RegistryConfig::default())
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = registry();
        assert!(registry.is_empty());
        assert_eq!(registry.get(&"anything".to_string()), None);
        assert!(registry.all().is_empty());
    }

    #[tokio::test]
    async fn test_bind_ingests_full_snapshot() {
        let registry = registry();
        let provider = Arc::new(StaticProvider::new(
            "items",
            vec![item("a", "1"), item("b", "2")],
        ));
        registry.add_provider(provider).await.unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&"a".to_string()), Some(item("a", "1")));
        assert_eq!(registry.get(&"b".to_string()), Some(item("b", "2")));
    }

    #[tokio::test]
    async fn test_add_then_get_and_remove_then_get() {
        let registry = registry();
        let provider = Arc::new(StaticProvider::new("items", vec![]));
        let pid = provider.provider_id();
        registry.add_provider(provider).await.unwrap();

        registry.added(&pid, item("a", "1")).await.unwrap();
        assert_eq!(registry.get(&"a".to_string()), Some(item("a", "1")));

        registry.removed(&pid, &"a".to_string()).await.unwrap();
        assert_eq!(registry.get(&"a".to_string()), None);
    }

    #[tokio::test]
    async fn test_idempotent_add_behaves_as_update() {
        let registry = registry();
        let provider = Arc::new(StaticProvider::new("items", vec![]));
        let pid = provider.provider_id();
        registry.add_provider(provider).await.unwrap();

        registry.added(&pid, item("a", "1")).await.unwrap();
        registry.added(&pid, item("a", "2")).await.unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&"a".to_string()), Some(item("a", "2")));
    }

    #[tokio::test]
    async fn test_remove_unowned_key_is_noop() {
        let registry = registry();
        let provider = Arc::new(StaticProvider::new("items", vec![item("a", "1")]));
        let pid = provider.provider_id();
        registry.add_provider(provider).await.unwrap();

        registry.removed(&pid, &"missing".to_string()).await.unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_update_unowned_key_is_noop() {
        let registry = registry();
        let p1 = Arc::new(StaticProvider::new("p1", vec![item("a", "1")]));
        let p2 = Arc::new(StaticProvider::new("p2", vec![]));
        let p2_id = p2.provider_id();
        registry.add_provider(p1).await.unwrap();
        registry.add_provider(p2).await.unwrap();

        // p2 never contributed "a", so its update must not take effect
        registry.updated(&p2_id, item("a", "hijacked")).await.unwrap();
        assert_eq!(registry.get(&"a".to_string()), Some(item("a", "1")));
    }

    #[tokio::test]
    async fn test_unbound_provider_report_rejected() {
        let registry = registry();
        let stray = ProviderId::new();
        let result = registry.added(&stray, item("a", "1")).await;
        assert_eq!(result, Err(RegistryError::UnknownProvider(stray)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_precedence_most_recently_bound_wins() {
        let registry = registry();
        let p1 = Arc::new(StaticProvider::new("p1", vec![item("k", "a")]));
        let p2 = Arc::new(StaticProvider::new("p2", vec![item("k", "b")]));
        let p1_id = p1.provider_id();
        let p2_id = p2.provider_id();

        registry.add_provider(p1).await.unwrap();
        registry.add_provider(p2).await.unwrap();
        assert_eq!(registry.get(&"k".to_string()), Some(item("k", "b")));

        // unbinding the shadowing provider reveals the older owner
        registry.remove_provider(&p2_id).await.unwrap();
        assert_eq!(registry.get(&"k".to_string()), Some(item("k", "a")));

        // unbinding the last owner retracts the key entirely
        registry.remove_provider(&p1_id).await.unwrap();
        assert_eq!(registry.get(&"k".to_string()), None);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_shadowed_insert_keeps_visible_entity() {
        let registry = registry();
        let p1 = Arc::new(StaticProvider::new("p1", vec![]));
        let p2 = Arc::new(StaticProvider::new("p2", vec![item("k", "b")]));
        let p1_id = p1.provider_id();

        registry.add_provider(p1).await.unwrap();
        registry.add_provider(p2).await.unwrap();

        // earlier-bound provider contributes under an already-shadowed key
        registry.added(&p1_id, item("k", "a")).await.unwrap();
        assert_eq!(registry.get(&"k".to_string()), Some(item("k", "b")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_rebind_same_provider_rejected() {
        let registry = registry();
        let provider = Arc::new(StaticProvider::new("items", vec![]));
        let pid = provider.provider_id();
        registry.add_provider(provider.clone()).await.unwrap();

        let result = registry.add_provider(provider).await;
        assert_eq!(result, Err(RegistryError::ProviderAlreadyBound(pid)));
    }

    #[tokio::test]
    async fn test_second_managed_provider_rejected() {
        let registry = registry();
        let first: Arc<InMemoryManagedProvider<Item>> =
            Arc::new(InMemoryManagedProvider::with_name("managed_a"));
        let second: Arc<InMemoryManagedProvider<Item>> =
            Arc::new(InMemoryManagedProvider::with_name("managed_b"));
        let first_id = first.provider_id();

        registry.add_managed_provider(first).await.unwrap();
        let result = registry.add_managed_provider(second).await;
        assert_eq!(result, Err(RegistryError::ManagedAlreadyBound(first_id)));
    }

    #[tokio::test]
    async fn test_unbinding_managed_provider_clears_managed_flag() {
        let registry = registry();
        let managed: Arc<InMemoryManagedProvider<Item>> =
            Arc::new(InMemoryManagedProvider::with_name("managed"));
        let pid = managed.provider_id();

        registry.add_managed_provider(managed).await.unwrap();
        assert!(registry.has_managed_provider());

        registry.remove_provider(&pid).await.unwrap();
        assert!(!registry.has_managed_provider());
        assert_eq!(
            registry.create(item("a", "1")).await,
            Err(RegistryError::NotManaged)
        );
    }

    #[tokio::test]
    async fn test_stats() {
        let registry = registry();
        let provider = Arc::new(StaticProvider::new(
            "items",
            vec![item("a", "1"), item("b", "2")],
        ));
        registry.add_provider(provider).await.unwrap();
        registry.start().await;

        let stats = registry.stats();
        assert_eq!(stats.total_entities, 2);
        assert_eq!(stats.total_providers, 1);
        assert!(!stats.managed_provider_bound);
        assert_eq!(stats.total_listeners, 0);
        assert_eq!(stats.events_dispatched, 2);
        assert!(stats.serving);
    }

    #[tokio::test]
    async fn test_shutdown_clears_state() {
        let registry = registry();
        let provider = Arc::new(StaticProvider::new("items", vec![item("a", "1")]));
        registry.add_provider(provider).await.unwrap();
        registry.start().await;

        registry.shutdown().await;
        assert!(registry.is_empty());
        let stats = registry.stats();
        assert_eq!(stats.total_providers, 0);
        assert!(!stats.serving);
    }
}
