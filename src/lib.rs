#![allow(clippy::doc_markdown)] // Allow technical terms in docs without backticks
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Registry Core
//!
//! In-process multi-provider aggregating registry with live change
//! notification.
//!
//! ## Overview
//!
//! Many independent, dynamically appearing and disappearing providers
//! contribute entities into a single consistent, queryable collection. One
//! privileged managed provider accepts external writes and is responsible
//! for durability; every accepted change is delivered synchronously to
//! registered listeners and, optionally, published onto a system-wide
//! event bus.
//!
//! ## Architecture
//!
//! The crate is built around one generic [`registry::AggregatingRegistry`]
//! parameterized over an entity type. Concrete registries (metadata,
//! items, things) are instantiations, not subclasses: see [`metadata`] for
//! the intended pattern. Providers are bound and unbound explicitly by the
//! embedder; collision precedence is deterministic (most recently bound
//! provider wins, retraction only when the last owner goes away).
//!
//! ## Key Features
//!
//! - **Dynamic provider binding** with atomic full-snapshot ingest and
//!   retraction under provider churn
//! - **Deterministic collision precedence** across overlapping key spaces
//! - **Synchronous listener dispatch** in mutation order, with per-listener
//!   failure isolation
//! - **Managed write path** with persist-then-announce ordering
//! - **Event bus adapter** serializing changes into envelope events
//! - **Readiness signalling** gating the moment the registry is serving
//!
//! ## Module Organization
//!
//! - [`entity`] - Entity identity contract
//! - [`provider`] - Provider and managed-provider capability traits
//! - [`registry`] - The aggregating registry core and listener dispatch
//! - [`events`] - Event envelopes, publisher, and the bus sink
//! - [`metadata`] - Concrete metadata registry instantiation
//! - [`readiness`] - Readiness tracker boundary
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use registry_core::config::RegistryConfig;
//! use registry_core::events::EventPublisher;
//! use registry_core::metadata::{Metadata, MetadataKey, MetadataRegistry};
//! use registry_core::registry::InMemoryManagedProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> registry_core::error::Result<()> {
//! let publisher = EventPublisher::default();
//! let registry = MetadataRegistry::new(RegistryConfig::default())
//!     .with_event_publisher(publisher.clone());
//!
//! let managed = Arc::new(InMemoryManagedProvider::with_name("managed_metadata"));
//! registry.registry().add_managed_provider(managed).await?;
//! registry.registry().start().await;
//!
//! let entry = Metadata::new(MetadataKey::new("homekit", "lamp"), "Lightbulb");
//! registry.registry().create(entry).await?;
//! assert_eq!(registry.namespaces_of("lamp").len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod logging;
pub mod metadata;
pub mod provider;
pub mod readiness;
pub mod registry;

pub use config::{ConfigurationError, EventConfig, ReadinessConfig, RegistryConfig};
pub use entity::Identifiable;
pub use error::{PersistError, RegistryError, Result};
pub use events::{ChangeAction, EventBusSink, EventEnvelope, EventPublisher, PublishError};
pub use provider::{ManagedProvider, Provider, ProviderId};
pub use readiness::{ReadinessTracker, ReadySignal};
pub use registry::{
    AggregatingRegistry, AggregatorStats, InMemoryManagedProvider, ListenerError, ListenerId,
    RegistryChange, RegistryChangeListener,
};
