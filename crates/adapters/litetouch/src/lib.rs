//! # litehub-adapter-litetouch
//!
//! Bridges a LiteTouch lighting bus into litehub.
//!
//! ## How it works
//!
//! A [`LiteTouchController`] keeps one TCP connection to a serial-to-IP
//! bridge, queues outbound commands and fans inbound frames out by
//! address. Each configured switch becomes a [`LiteTouchSwitch`] holding
//! the controller; its device and entity are registered during
//! [`setup`](Integration::setup) and its state is kept current by one
//! listener task per switch.
//!
//! | Config | Activation | Deactivation |
//! |--------|------------|--------------|
//! | `toggle = true` | `CTGSW` pulse | same `CTGSW` pulse |
//! | `timed = true` | `CSCLK` clock set | `CSLOF` load off |
//! | otherwise | `CSLON` load on | `CSLOF` load off |
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `litehub-app` and `litehub-domain`.

pub mod address;
mod config;
pub mod controller;
pub mod dispatcher;
mod error;
pub mod protocol;
pub mod registry;
mod switch;

#[cfg(test)]
mod test_support;

pub use address::Address;
pub use config::{LiteTouchConfig, SwitchConfig};
pub use controller::{Controller, LiteTouchController};
pub use error::{LiteTouchError, ProtocolError};
pub use switch::LiteTouchSwitch;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use litehub_app::ports::integration::{DiscoveredDevice, Integration, IntegrationContext};
use litehub_domain::entity::{Entity, EntityState};
use litehub_domain::error::{LiteHubError, NotFoundError};
use litehub_domain::id::EntityId;
use litehub_domain::service::Service;

use dispatcher::Subscription;

/// Integration name, also stored on every device.
pub const INTEGRATION_NAME: &str = "litetouch";

/// Build one switch per configured entry, all sharing `controller`.
#[must_use]
pub fn setup_switches<C: Controller>(
    config: &LiteTouchConfig,
    controller: &Arc<C>,
) -> Vec<LiteTouchSwitch<C>> {
    config
        .switches
        .iter()
        .map(|switch| LiteTouchSwitch::new(switch.clone(), Arc::clone(controller)))
        .collect()
}

/// A switch together with the entity last written for it.
struct Binding<C> {
    switch: Arc<LiteTouchSwitch<C>>,
    stored: Arc<Mutex<Entity>>,
}

impl<C> Clone for Binding<C> {
    fn clone(&self) -> Self {
        Self {
            switch: Arc::clone(&self.switch),
            stored: Arc::clone(&self.stored),
        }
    }
}

impl<C: Controller> Binding<C> {
    fn new(switch: Arc<LiteTouchSwitch<C>>, stored: Entity) -> Self {
        Self {
            switch,
            stored: Arc::new(Mutex::new(stored)),
        }
    }

    fn stored(&self) -> MutexGuard<'_, Entity> {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored entity with the switch's cached state and attributes merged
    /// in. Timestamps stay those of the last write.
    fn current(&self) -> Entity {
        let mut entity = self.stored().clone();
        entity.state = EntityState::from(self.switch.is_on());
        entity.attributes = self.switch.attributes();
        entity
    }

    fn remember(&self, saved: Entity) {
        *self.stored() = saved;
    }
}

/// LiteTouch integration driving a set of switches through one controller.
pub struct LiteTouchIntegration<C> {
    switches: Vec<Arc<LiteTouchSwitch<C>>>,
    bindings: HashMap<EntityId, Binding<C>>,
    pending: Vec<(Binding<C>, Subscription)>,
    listeners: Vec<JoinHandle<()>>,
}

impl<C: Controller + 'static> LiteTouchIntegration<C> {
    #[must_use]
    pub fn new(switches: Vec<LiteTouchSwitch<C>>) -> Self {
        Self {
            switches: switches.into_iter().map(Arc::new).collect(),
            bindings: HashMap::new(),
            pending: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Shortcut for `new(setup_switches(config, controller))`.
    #[must_use]
    pub fn from_config(config: &LiteTouchConfig, controller: &Arc<C>) -> Self {
        Self::new(setup_switches(config, controller))
    }

    /// Check whether this integration owns the given entity.
    #[must_use]
    pub fn owns_entity(&self, entity_id: EntityId) -> bool {
        self.bindings.contains_key(&entity_id)
    }
}

impl<C: Controller + 'static> Integration for LiteTouchIntegration<C> {
    fn name(&self) -> &'static str {
        INTEGRATION_NAME
    }

    async fn setup(&mut self, ctx: &impl IntegrationContext) -> Result<(), LiteHubError> {
        for switch in &self.switches {
            let subscription = switch.attach();
            let device = switch.device()?;
            let entity = switch.entity(EntityId::new(), device.id)?;
            let stored = ctx
                .persist_discovered(DiscoveredDevice {
                    device,
                    entities: vec![entity],
                })
                .await?;

            let entity = stored
                .entities
                .into_iter()
                .next()
                .ok_or_else(|| NotFoundError {
                    entity: "Entity",
                    id: switch.address().signal(),
                })?;
            let entity_id = entity.id;
            let binding = Binding::new(Arc::clone(switch), entity);
            tracing::debug!(address = %switch.address(), %entity_id, "switch registered");
            self.bindings.insert(entity_id, binding.clone());
            self.pending.push((binding, subscription));
        }

        tracing::info!(count = self.bindings.len(), "LiteTouch switches registered");
        Ok(())
    }

    async fn start_background(
        &mut self,
        ctx: impl IntegrationContext + Clone + 'static,
    ) -> Result<(), LiteHubError> {
        for (binding, subscription) in self.pending.drain(..) {
            self.listeners
                .push(tokio::spawn(listen(binding, subscription, ctx.clone())));
        }
        tracing::info!(
            listeners = self.listeners.len(),
            "LiteTouch listeners started"
        );
        Ok(())
    }

    async fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: &str,
        _data: serde_json::Value,
    ) -> Result<Entity, LiteHubError> {
        let binding = self.bindings.get(&entity_id).ok_or_else(|| NotFoundError {
            entity: "Entity",
            id: entity_id.to_string(),
        })?;

        let switch = &binding.switch;
        match service.parse::<Service>()? {
            Service::TurnOn => switch.turn_on(),
            Service::TurnOff => switch.turn_off(),
            Service::Toggle => switch.toggle(),
        }?;

        Ok(binding.current())
    }

    async fn teardown(&mut self) -> Result<(), LiteHubError> {
        for handle in self.listeners.drain(..) {
            handle.abort();
        }
        self.pending.clear();
        tracing::info!("LiteTouch integration stopped");
        Ok(())
    }
}

/// Apply frames for one switch and persist every recognized update.
async fn listen<C, X>(binding: Binding<C>, mut subscription: Subscription, ctx: X)
where
    C: Controller,
    X: IntegrationContext,
{
    while let Some(frame) = subscription.recv().await {
        match binding.switch.handle_update(&frame) {
            Ok(true) => match ctx.upsert_entity(binding.current()).await {
                Ok(saved) => binding.remember(saved),
                Err(err) => {
                    tracing::warn!(address = %binding.switch.address(), error = %err, "failed to persist switch state");
                }
            },
            Ok(false) => {
                tracing::trace!(address = %binding.switch.address(), msg_type = %frame.msg_type, "frame ignored");
            }
            Err(err) => {
                tracing::warn!(address = %binding.switch.address(), error = %err, "rejected LiteTouch status frame");
            }
        }
    }
    tracing::debug!(address = %binding.switch.address(), "switch subscription closed");
}
