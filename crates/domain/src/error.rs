//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`LiteHubError`] via `#[from]` (no `String` variants).

/// Top-level error shared by the domain, application and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum LiteHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// Infrastructure failure (database, transport, …) boxed by the adapter
    /// that produced it.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("entity_id must not be empty")]
    EmptyEntityId,

    #[error("friendly_name must not be empty")]
    EmptyFriendlyName,

    #[error("invalid identifier")]
    InvalidId,

    #[error("unknown service {0:?}")]
    UnknownService(String),
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of the missing record (e.g. `"Entity"`, `"Device"`).
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}
