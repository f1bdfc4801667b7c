//! # Readiness Signalling
//!
//! Boundary contract for the readiness tracker collaborator: the registry
//! reports when it transitions between "not yet serving" and "serving" so
//! that dependents can gate their own startup on it. The tracker itself is
//! injected at construction; [`ReadySignal`] is the in-process
//! implementation used by embedders and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::info;

/// Well-known readiness topics.
pub mod topics {
    /// Default topic reported by a registry once it is serving reads.
    pub const REGISTRY_SERVING: &str = "registry.serving";
}

/// Receiver of readiness transitions, keyed by topic.
///
/// `mark_ready` is called once when a registry starts serving;
/// `mark_not_ready` on teardown. Implementations must tolerate repeated
/// marks for the same topic.
#[async_trait]
pub trait ReadinessTracker: Send + Sync {
    async fn mark_ready(&self, topic: &str);

    async fn mark_not_ready(&self, topic: &str);
}

/// In-process readiness tracker backed by a topic set.
#[derive(Debug, Default)]
pub struct ReadySignal {
    ready_topics: RwLock<HashSet<String>>,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the given topic is currently marked ready.
    pub fn is_ready(&self, topic: &str) -> bool {
        self.ready_topics.read().contains(topic)
    }
}

#[async_trait]
impl ReadinessTracker for ReadySignal {
    async fn mark_ready(&self, topic: &str) {
        let newly = self.ready_topics.write().insert(topic.to_string());
        if newly {
            info!(topic = %topic, "readiness topic marked ready");
        }
    }

    async fn mark_not_ready(&self, topic: &str) {
        let removed = self.ready_topics.write().remove(topic);
        if removed {
            info!(topic = %topic, "readiness topic marked not ready");
        }
    }
}
