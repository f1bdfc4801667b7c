//! # Event System
//!
//! Loosely-coupled observability for registry changes: every accepted
//! add/update/remove can be serialized into an [`EventEnvelope`] and
//! published onto a broadcast channel for system-wide consumers. The bus is
//! a downstream observer only; publication failures never roll back the
//! registry mutation that produced them.

pub mod envelope;
pub mod publisher;
pub mod sink;

// Re-export key types for convenience
pub use envelope::{ChangeAction, EventEnvelope};
pub use publisher::{EventPublisher, PublishError};
pub use sink::EventBusSink;
