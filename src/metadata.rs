//! # Metadata Registry
//!
//! Concrete instantiation of the aggregating registry for item metadata:
//! free-form annotations attached to named items, keyed by
//! `(namespace, item name)`. This module shows the intended pattern for
//! concrete registries: a thin wrapper owning an
//! [`AggregatingRegistry<Metadata>`] plus the handful of domain queries
//! that do not generalize.

use crate::config::RegistryConfig;
use crate::entity::Identifiable;
use crate::error::Result;
use crate::events::publisher::EventPublisher;
use crate::readiness::ReadinessTracker;
use crate::registry::AggregatingRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Namespaces starting with this prefix are reserved for internal use and
/// are not meant to be shown to users.
pub const INTERNAL_NAMESPACE_PREFIX: &str = "_";

/// Key of a metadata entry: one namespace annotation on one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataKey {
    pub namespace: String,
    pub item_name: String,
}

impl MetadataKey {
    pub fn new(namespace: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            item_name: item_name.into(),
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.item_name)
    }
}

/// A metadata entry: a main value plus free-form configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub key: MetadataKey,
    pub value: String,
    #[serde(default)]
    pub configuration: HashMap<String, serde_json::Value>,
}

impl Metadata {
    pub fn new(key: MetadataKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
            configuration: HashMap::new(),
        }
    }

    pub fn with_configuration(
        mut self,
        configuration: HashMap<String, serde_json::Value>,
    ) -> Self {
        self.configuration = configuration;
        self
    }
}

impl Identifiable for Metadata {
    type Key = MetadataKey;

    fn key(&self) -> MetadataKey {
        self.key.clone()
    }
}

/// Registry tracking all declared metadata of all metadata providers.
pub struct MetadataRegistry {
    inner: AggregatingRegistry<Metadata>,
}

impl MetadataRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            inner: AggregatingRegistry::new(config),
        }
    }

    pub fn with_readiness_tracker(self, tracker: Arc<dyn ReadinessTracker>) -> Self {
        Self {
            inner: self.inner.with_readiness_tracker(tracker),
        }
    }

    pub fn with_event_publisher(self, publisher: EventPublisher) -> Self {
        Self {
            inner: self.inner.with_event_publisher(publisher),
        }
    }

    /// The underlying aggregating registry: provider binding, reads,
    /// writes, and listener registration all go through here.
    pub fn registry(&self) -> &AggregatingRegistry<Metadata> {
        &self.inner
    }

    /// Whether a namespace is reserved for internal use.
    pub fn is_internal_namespace(namespace: &str) -> bool {
        namespace.starts_with(INTERNAL_NAMESPACE_PREFIX)
    }

    /// All namespaces currently annotating a particular item.
    pub fn namespaces_of(&self, item_name: &str) -> HashSet<String> {
        self.inner
            .all()
            .into_iter()
            .filter(|metadata| metadata.key.item_name == item_name)
            .map(|metadata| metadata.key.namespace)
            .collect()
    }

    /// Remove every managed metadata entry of a particular item.
    ///
    /// Only managed entries are affected; entries contributed by other
    /// providers stay. Without a managed provider this is a quiet no-op.
    pub async fn remove_item_metadata(&self, item_name: &str) -> Result<()> {
        if !self.inner.has_managed_provider() {
            debug!(
                item = %item_name,
                "no managed provider bound, skipping item metadata removal"
            );
            return Ok(());
        }
        let keys: Vec<MetadataKey> = self
            .inner
            .all()
            .into_iter()
            .filter(|metadata| metadata.key.item_name == item_name)
            .map(|metadata| metadata.key)
            .collect();
        for key in keys {
            self.inner.delete(&key).await?;
        }
        Ok(())
    }
}
