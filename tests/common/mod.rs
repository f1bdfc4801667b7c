//! Shared helpers for registry integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use registry_core::config::RegistryConfig;
use registry_core::entity::Identifiable;
use registry_core::error::PersistError;
use registry_core::provider::{ManagedProvider, Provider, ProviderId};
use registry_core::registry::{ListenerError, RegistryChangeListener};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Entity type used across the integration suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEntity {
    pub id: String,
    pub value: String,
}

impl Identifiable for TestEntity {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

pub fn entity(id: &str, value: &str) -> TestEntity {
    TestEntity {
        id: id.to_string(),
        value: value.to_string(),
    }
}

pub fn test_config() -> RegistryConfig {
    RegistryConfig::default()
}

/// Provider serving a mutable snapshot; tests report incremental changes
/// through the registry's provider-facing methods directly.
pub struct SnapshotProvider {
    id: ProviderId,
    name: String,
    snapshot: Mutex<Vec<TestEntity>>,
}

impl SnapshotProvider {
    pub fn new(name: &str, snapshot: Vec<TestEntity>) -> Arc<Self> {
        Arc::new(Self {
            id: ProviderId::new(),
            name: name.to_string(),
            snapshot: Mutex::new(snapshot),
        })
    }

    pub fn empty(name: &str) -> Arc<Self> {
        Self::new(name, Vec::new())
    }

    pub fn set_snapshot(&self, snapshot: Vec<TestEntity>) {
        *self.snapshot.lock() = snapshot;
    }
}

#[async_trait]
impl Provider<TestEntity> for SnapshotProvider {
    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn get_all(&self) -> Vec<TestEntity> {
        self.snapshot.lock().clone()
    }
}

/// Managed provider whose storage backend is permanently offline.
pub struct FailingManagedProvider {
    id: ProviderId,
}

impl FailingManagedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: ProviderId::new(),
        })
    }

    fn offline() -> PersistError {
        PersistError::Backend {
            reason: "storage offline".to_string(),
        }
    }
}

#[async_trait]
impl Provider<TestEntity> for FailingManagedProvider {
    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn provider_name(&self) -> &str {
        "failing_managed_provider"
    }

    async fn get_all(&self) -> Vec<TestEntity> {
        Vec::new()
    }
}

#[async_trait]
impl ManagedProvider<TestEntity> for FailingManagedProvider {
    async fn persist_create(&self, _entity: TestEntity) -> Result<TestEntity, PersistError> {
        Err(Self::offline())
    }

    async fn persist_update(
        &self,
        _entity: TestEntity,
    ) -> Result<Option<TestEntity>, PersistError> {
        Err(Self::offline())
    }

    async fn persist_delete(&self, _key: &String) -> Result<Option<TestEntity>, PersistError> {
        Err(Self::offline())
    }
}

/// One notification as seen by a [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    Added { key: String, value: String },
    Updated { key: String, old: String, new: String },
    Removed { key: String, value: String },
}

/// Listener recording every notification it receives.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl RegistryChangeListener<TestEntity> for RecordingListener {
    async fn entity_added(&self, entity: &TestEntity) -> Result<(), ListenerError> {
        self.events.lock().push(ObservedEvent::Added {
            key: entity.id.clone(),
            value: entity.value.clone(),
        });
        Ok(())
    }

    async fn entity_updated(
        &self,
        old: &TestEntity,
        new: &TestEntity,
    ) -> Result<(), ListenerError> {
        self.events.lock().push(ObservedEvent::Updated {
            key: new.id.clone(),
            old: old.value.clone(),
            new: new.value.clone(),
        });
        Ok(())
    }

    async fn entity_removed(&self, entity: &TestEntity) -> Result<(), ListenerError> {
        self.events.lock().push(ObservedEvent::Removed {
            key: entity.id.clone(),
            value: entity.value.clone(),
        });
        Ok(())
    }

    fn listener_name(&self) -> &str {
        "recording_listener"
    }
}

/// Listener that fails on every callback, for isolation tests.
pub struct FailingListener;

#[async_trait]
impl RegistryChangeListener<TestEntity> for FailingListener {
    async fn entity_added(&self, _entity: &TestEntity) -> Result<(), ListenerError> {
        Err("listener exploded".into())
    }

    async fn entity_updated(
        &self,
        _old: &TestEntity,
        _new: &TestEntity,
    ) -> Result<(), ListenerError> {
        Err("listener exploded".into())
    }

    async fn entity_removed(&self, _entity: &TestEntity) -> Result<(), ListenerError> {
        Err("listener exploded".into())
    }

    fn listener_name(&self) -> &str {
        "failing_listener"
    }
}

/// Listener appending its tag to a shared log, for cross-listener
/// ordering tests.
pub struct TaggedListener {
    tag: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl TaggedListener {
    pub fn new(tag: &str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            tag: tag.to_string(),
            log,
        })
    }
}

#[async_trait]
impl RegistryChangeListener<TestEntity> for TaggedListener {
    async fn entity_added(&self, entity: &TestEntity) -> Result<(), ListenerError> {
        self.log.lock().push(format!("{}:added:{}", self.tag, entity.id));
        Ok(())
    }

    fn listener_name(&self) -> &str {
        &self.tag
    }
}
