//! # Registry Infrastructure
//!
//! The aggregating registry core and its capability contracts.
//!
//! ## Overview
//!
//! A registry owns the merged view over all bound providers: it resolves
//! key collisions deterministically, forwards provider-level change events
//! to registered listeners, and routes external writes to the managed
//! provider. Concrete registries (metadata, items, things) are
//! instantiations of the one generic [`AggregatingRegistry`], not
//! subclasses with overridden lifecycle hooks.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── AggregatingRegistry       (merged view, ownership index, dispatch)
//! ├── RegistryChangeListener    (observer contract)
//! └── InMemoryManagedProvider   (reference managed provider)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use registry_core::config::RegistryConfig;
//! use registry_core::registry::{AggregatingRegistry, InMemoryManagedProvider};
//! use std::sync::Arc;
//!
//! # use registry_core::entity::Identifiable;
//! # #[derive(Debug, Clone, PartialEq)]
//! # struct Item { name: String }
//! # impl Identifiable for Item {
//! #     type Key = String;
//! #     fn key(&self) -> String { self.name.clone() }
//! # }
//! # async fn example() -> registry_core::error::Result<()> {
//! let registry = AggregatingRegistry::<Item>::new(RegistryConfig::default());
//! registry
//!     .add_managed_provider(Arc::new(InMemoryManagedProvider::with_name("managed_items")))
//!     .await?;
//!
//! let stored = registry.create(Item { name: "lamp".to_string() }).await?;
//! assert!(registry.get(&stored.name).is_some());
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod listener;
pub mod memory;

// Re-export main types for easy access
pub use aggregator::{AggregatingRegistry, AggregatorStats};
pub use listener::{ListenerError, ListenerId, RegistryChange, RegistryChangeListener};
pub use memory::InMemoryManagedProvider;
