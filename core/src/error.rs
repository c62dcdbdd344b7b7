//! Error taxonomy for the asset graph cache layer.
//!
//! Four error kinds. Each gets its own variant group so
//! call sites can match on the kind without string-sniffing a message.

use crate::identity::EntityId;
use thiserror::Error;

/// Argument validation failures. Fail fast, no partial effect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidArgumentError {
    #[error("{what} must not be nil/empty")]
    Empty { what: &'static str },

    #[error("{what} must be non-nil")]
    Nil { what: &'static str },
}

/// The requested object is absent after any applicable fill attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("entity not found: {id}")]
    Entity { id: EntityId },

    #[error("edge not found: {id}")]
    Edge { id: EntityId },

    #[error("entity tag not found: {id}")]
    EntityTag { id: EntityId },

    #[error("edge tag not found: {id}")]
    EdgeTag { id: EntityId },

    #[error("no entity matches content key")]
    ByContent,

    #[error("no entities of type {asset_type} found")]
    ByType { asset_type: String },
}

/// A required bookkeeping tag was missing where the protocol guarantees one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantBrokenError {
    #[error("missing {tag_name} binding on {host_id}; writes require a prior binding")]
    MissingBinding {
        tag_name: &'static str,
        host_id: EntityId,
    },

    #[error("expected exactly one authoritative match for {host_id}, found {found}")]
    AmbiguousContentMatch { host_id: EntityId, found: usize },
}

/// An error surfaced from one of the two delegate stores.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{store} backend error: {reason}")]
pub struct BackendError {
    pub store: &'static str,
    pub reason: String,
}

/// Master error type for the cache layer and its delegate stores.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgumentError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("invariant broken: {0}")]
    InvariantBroken(#[from] InvariantBrokenError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("config error: {0}")]
    Config(String),
}

impl CacheError {
    /// True for the `not-found` kind — used by read paths that treat
    /// "cache came back empty" as a signal to keep trying the authoritative
    /// store rather than a hard failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }

    pub fn backend(store: &'static str, reason: impl Into<String>) -> Self {
        CacheError::Backend(BackendError {
            store,
            reason: reason.into(),
        })
    }
}

/// Result type alias used throughout the cache layer.
pub type CacheResult<T> = Result<T, CacheError>;
