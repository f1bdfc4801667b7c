//! # Structured Error Handling
//!
//! Error taxonomy for registry operations. Nothing in this crate is a
//! process-fatal condition; every failure is local to the offending
//! operation and is either surfaced to the caller or logged as a no-op.

use crate::provider::ProviderId;
use thiserror::Error;

/// Errors surfaced by registry operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// An external write was attempted with no managed provider bound.
    #[error("no managed provider is bound")]
    NotManaged,

    /// The managed provider failed to durably store a change. The merged
    /// view is left unchanged.
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),

    /// A change report or removal named a provider that is not bound.
    #[error("provider {0} is not bound")]
    UnknownProvider(ProviderId),

    /// The binding mechanism attempted to bind the same provider instance
    /// twice without an intervening removal.
    #[error("provider {0} is already bound")]
    ProviderAlreadyBound(ProviderId),

    /// A managed provider is already bound; at most one is allowed.
    #[error("a managed provider is already bound ({0})")]
    ManagedAlreadyBound(ProviderId),
}

/// Errors raised by a managed provider's persistence layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistError {
    /// `create` was called for a key that is already stored.
    #[error("entity already exists: {key}")]
    AlreadyExists { key: String },

    /// The storage backend rejected or failed the operation.
    #[error("storage backend failure: {reason}")]
    Backend { reason: String },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
