//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod device_service;
pub mod entity_service;
pub mod integration_context;
pub mod service_call;

#[cfg(test)]
pub(crate) mod test_support;
