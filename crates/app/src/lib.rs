//! # litehub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `EntityRepository`: CRUD for entities
//!   - `DeviceRepository`: CRUD for devices
//!   - `EventPublisher`: fire domain events
//!   - `Integration` / `IntegrationContext`: device integration lifecycle
//! - Define **driving/inbound ports** as use-case structs:
//!   - `EntityService`: upsert, update state, list, get
//!   - `DeviceService`: upsert, list, get
//!   - `ServiceCallService`: route `turn_on` / `turn_off` / `toggle` to an integration
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `litehub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod services;
