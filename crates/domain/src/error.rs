//! Common error types used across the workspace.
//!
//! The domain layer provides [`ValidationError`] and [`NotFoundError`].
//! Adapter layers wire their own failures into [`BridgeError`] via the
//! transport and sink variants.

/// Validation failures raised by domain invariant checks.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("device id cannot be empty")]
    EmptyDeviceId,
    #[error("device name cannot be empty")]
    EmptyName,
    #[error("hub id cannot be empty")]
    EmptyHubId,
    #[error("device is not bound to a hub")]
    MissingHub,
}

/// Returned when a lookup by identifier finds nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Top-level error for the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Validation error")]
    Validation(#[from] ValidationError),

    #[error("Not found")]
    NotFound(#[from] NotFoundError),

    #[error("Transport error")]
    Transport(#[source] std::io::Error),

    #[error("Sink rejected event")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Convenience alias used throughout the domain and application layers.
pub type Result<T> = std::result::Result<T, BridgeError>;
