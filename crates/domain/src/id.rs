//! Typed identifiers.
//!
//! Every record is keyed by a random UUID. [`Id`] tags that UUID with the
//! kind of record it points at, so an [`EntityId`] cannot be passed where a
//! [`DeviceId`] is expected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::ValidationError;

/// Record kind an [`Id`] refers to.
pub trait Kind {
    /// Label used in debug output.
    const NAME: &'static str;
}

/// Marker for entity identifiers.
#[derive(Debug)]
pub enum EntityKind {}

/// Marker for device identifiers.
#[derive(Debug)]
pub enum DeviceKind {}

/// Marker for event identifiers.
#[derive(Debug)]
pub enum EventKind {}

impl Kind for EntityKind {
    const NAME: &'static str = "EntityId";
}

impl Kind for DeviceKind {
    const NAME: &'static str = "DeviceId";
}

impl Kind for EventKind {
    const NAME: &'static str = "EventId";
}

/// Identifier for an [`Entity`](crate::entity::Entity).
pub type EntityId = Id<EntityKind>;
/// Identifier for a [`Device`](crate::device::Device).
pub type DeviceId = Id<DeviceKind>;
/// Identifier for an [`Event`](crate::event::Event).
pub type EventId = Id<EventKind>;

/// A UUID tagged with the kind of record it identifies.
///
/// Displays and serializes as the bare hyphenated UUID.
pub struct Id<K> {
    uuid: Uuid,
    kind: PhantomData<fn() -> K>,
}

impl<K> Id<K> {
    /// Generate a fresh random (v4) identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::wrap(Uuid::new_v4())
    }

    fn wrap(uuid: Uuid) -> Self {
        Self {
            uuid,
            kind: PhantomData,
        }
    }
}

impl<K> Default for Id<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for Id<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Id<K> {}

impl<K> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<K> Eq for Id<K> {}

impl<K> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<K: Kind> fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", K::NAME, self.uuid)
    }
}

impl<K> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.uuid.hyphenated().fmt(f)
    }
}

impl<K> FromStr for Id<K> {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw.trim())
            .map(Self::wrap)
            .map_err(|_| ValidationError::InvalidId)
    }
}

impl<K> Serialize for Id<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, K> Deserialize<'de> for Id<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::wrap)
    }
}
