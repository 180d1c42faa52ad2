//! Host-assigned identifier newtypes and the bridge identities derived
//! from them.
//!
//! The hub id is minted by the host environment; 32 lowercase hex characters
//! are the preferred shape. Derived identities (bridge UUID, bridge id,
//! per-device unique ids) always work from a normalized 32-character hex
//! core so any non-empty input yields deterministic values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Stable identity of a hub (one network personality).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HubId(String);

impl HubId {
    /// Wrap a host-assigned hub id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyHubId`] when `raw` is empty or
    /// whitespace-only.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyHubId);
        }
        Ok(Self(raw))
    }

    /// The raw id as assigned by the host.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 32-character lowercase hex core backing every derived identity.
    ///
    /// Non-hex characters are dropped and the remainder is repeated
    /// cyclically up to 32 characters, so ids shorter than the preferred
    /// shape still derive stable values.
    fn hex_core(&self) -> String {
        let digits: Vec<char> = self
            .0
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let digits = if digits.is_empty() { vec!['0'] } else { digits };

        (0..32).map(|i| digits[i % digits.len()]).collect()
    }

    /// Value of the `hue-bridgeid` / `BRIDGEID` headers.
    #[must_use]
    pub fn bridge_id(&self) -> String {
        self.hex_core().to_ascii_uppercase()
    }

    /// Deterministic bridge UUID: fixed Hue prefix plus the first twelve
    /// hex-core characters as the node part.
    #[must_use]
    pub fn bridge_uuid(&self) -> String {
        format!("2f402f80-da50-11e1-9b23-{}", &self.hex_core()[..12])
    }

    /// Synthetic unique id for the device at 1-based `index`: seven 4-char
    /// hub slices, the index in two lowercase hex digits, and a fixed
    /// endpoint suffix.
    #[must_use]
    pub fn unique_id(&self, index: usize) -> String {
        let core = self.hex_core();
        let slices: Vec<&str> = (0..7).map(|i| &core[i * 4..i * 4 + 4]).collect();
        format!("{}:{:02x}-01", slices.join(":"), index)
    }

    /// MAC-style address reported in the bridge config.
    #[must_use]
    pub fn mac_address(&self) -> String {
        let core = self.hex_core();
        (0..6)
            .map(|i| &core[i * 2..i * 2 + 2])
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for HubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HubId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Opaque identity of a device, minted by the host environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a host-assigned device id.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for DeviceId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}
