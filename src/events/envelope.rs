//! Serialized form of a registry change, as published to the event bus.
//!
//! Envelopes carry a dotted event type for filtering, a hierarchical topic
//! identifying the affected entity, and the entity payload itself, so that
//! consumers can subscribe without any compile-time knowledge of the
//! entity types flowing through a given registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of merged-view mutation an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Added,
    Updated,
    Removed,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Added => "added",
            ChangeAction::Updated => "updated",
            ChangeAction::Removed => "removed",
        }
    }
}

/// A registry change serialized for the event bus.
///
/// - `event_type`: `registry.entity.<action>`
/// - `topic`: `registry/<collection>/<key>/<action>`
/// - `payload`: entity serialization; updates also carry the prior value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
    pub topic: String,
    pub payload: Value,
    pub published_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Create an envelope with the current timestamp.
    pub fn new(
        event_type: impl Into<String>,
        topic: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            topic: topic.into(),
            payload,
            published_at: Utc::now(),
        }
    }

    /// Build the envelope for a registry change on `collection`/`key`.
    pub fn for_change(collection: &str, key: &str, action: ChangeAction, payload: Value) -> Self {
        Self::new(
            format!("registry.entity.{}", action.as_str()),
            format!("registry/{}/{}/{}", collection, key, action.as_str()),
            payload,
        )
    }
}
