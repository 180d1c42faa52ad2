//! Device record — a controllable endpoint bound to exactly one hub.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, ValidationError};
use crate::id::{DeviceId, HubId};

/// A controllable endpoint as registered by the host environment.
///
/// The hub binding never changes for the lifetime of a record; reparenting
/// means destroying and recreating the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub name: String,
    pub hub: HubId,
    /// Overrides the semantic topic on delivered messages when set.
    pub topic: Option<String>,
}

impl DeviceRecord {
    /// Create a builder for constructing a [`DeviceRecord`].
    #[must_use]
    pub fn builder() -> DeviceRecordBuilder {
        DeviceRecordBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when `id` or `name` is empty.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`DeviceRecord`].
#[derive(Debug, Default)]
pub struct DeviceRecordBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    hub: Option<HubId>,
    topic: Option<String>,
}

impl DeviceRecordBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn hub(mut self, hub: HubId) -> Self {
        self.hub = Some(hub);
        self
    }

    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Consume the builder, validate, and return a [`DeviceRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] if the hub binding is missing or
    /// `id`/`name` are empty.
    pub fn build(self) -> Result<DeviceRecord, BridgeError> {
        let record = DeviceRecord {
            id: self.id.unwrap_or_else(|| DeviceId::new("")),
            name: self.name.unwrap_or_default(),
            hub: self.hub.ok_or(ValidationError::MissingHub)?,
            topic: self.topic,
        };
        record.validate()?;
        Ok(record)
    }
}
