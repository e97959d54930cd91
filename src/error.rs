//! Error taxonomy for the core services.
//!
//! Persistence failures are fatal to the enclosing operation and propagate to
//! the caller. Live-delivery failures never do — the dispatcher absorbs them
//! by evicting the dead handle, so `DeliveryFailed` only ever crosses the
//! transport-handle boundary, not a service boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid credential. Surfaced to the caller, request aborted.
    #[error("unauthenticated")]
    Unauthenticated,

    /// A referenced entity is absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An idempotency or uniqueness contract was violated.
    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// Live push to a transport handle failed. Advisory only.
    #[error("live delivery failed")]
    DeliveryFailed,

    /// The document store rejected an operation.
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// Shorthand for store-layer failures.
    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }
}
