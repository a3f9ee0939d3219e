//! # litehub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API for entities and devices
//! - Forward `POST /api/entities/{id}/services/{service}` to the
//!   service-call use-case
//! - Stream domain events over SSE (`/api/events/stream`)
//! - Map application errors into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `litehub-app` (for port traits and services) and `litehub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod test_support;

pub use error::ApiError;
pub use router::build;
pub use state::AppState;
