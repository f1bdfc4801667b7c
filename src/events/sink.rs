//! # Event Bus Sink
//!
//! A [`RegistryChangeListener`] that forwards every accepted change onto
//! the event bus as an [`EventEnvelope`]. The merged view is the source of
//! truth and the bus is a downstream observer: serialization and publish
//! failures are logged and swallowed, never propagated back into the
//! registry mutation that produced the change.

use crate::entity::Identifiable;
use crate::events::envelope::{ChangeAction, EventEnvelope};
use crate::events::publisher::EventPublisher;
use crate::registry::listener::{ListenerError, RegistryChangeListener};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Display;
use std::marker::PhantomData;
use tracing::warn;

/// Default listener that publishes registry changes onto an event bus.
pub struct EventBusSink<E> {
    publisher: EventPublisher,
    collection: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> EventBusSink<E> {
    pub fn new(publisher: EventPublisher, collection: impl Into<String>) -> Self {
        Self {
            publisher,
            collection: collection.into(),
            _entity: PhantomData,
        }
    }

    /// The publisher this sink forwards to.
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }
}

impl<E> EventBusSink<E>
where
    E: Identifiable + Serialize,
    E::Key: Display,
{
    fn entity_value(&self, entity: &E, action: ChangeAction) -> Option<Value> {
        match serde_json::to_value(entity) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(
                    collection = %self.collection,
                    action = %action.as_str(),
                    error = %error,
                    "entity serialization failed, change event dropped"
                );
                None
            }
        }
    }

    async fn forward(&self, action: ChangeAction, key: &E::Key, payload: Value) {
        let envelope =
            EventEnvelope::for_change(&self.collection, &key.to_string(), action, payload);
        if let Err(error) = self.publisher.publish(envelope).await {
            warn!(
                collection = %self.collection,
                action = %action.as_str(),
                error = %error,
                "event bus publish failed, change event dropped"
            );
        }
    }
}

#[async_trait]
impl<E> RegistryChangeListener<E> for EventBusSink<E>
where
    E: Identifiable + Serialize,
    E::Key: Display,
{
    async fn entity_added(&self, entity: &E) -> Result<(), ListenerError> {
        if let Some(value) = self.entity_value(entity, ChangeAction::Added) {
            self.forward(ChangeAction::Added, &entity.key(), json!({ "entity": value }))
                .await;
        }
        Ok(())
    }

    async fn entity_updated(&self, old: &E, new: &E) -> Result<(), ListenerError> {
        let (Some(new_value), Some(old_value)) = (
            self.entity_value(new, ChangeAction::Updated),
            self.entity_value(old, ChangeAction::Updated),
        ) else {
            return Ok(());
        };
        self.forward(
            ChangeAction::Updated,
            &new.key(),
            json!({ "entity": new_value, "previous": old_value }),
        )
        .await;
        Ok(())
    }

    async fn entity_removed(&self, entity: &E) -> Result<(), ListenerError> {
        if let Some(value) = self.entity_value(entity, ChangeAction::Removed) {
            self.forward(
                ChangeAction::Removed,
                &entity.key(),
                json!({ "entity": value }),
            )
            .await;
        }
        Ok(())
    }

    fn listener_name(&self) -> &str {
        "event_bus_sink"
    }
}
