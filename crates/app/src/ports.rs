//! Ports — the interfaces the host environment implements.
//!
//! The bridge never owns device records or handlers. The host registers
//! records, keeps them iterable, and hands out live sinks; the bridge
//! recomputes its view from these ports on every request.

use std::sync::Arc;

use serde_json::Value;

use echobridge_domain::device::DeviceRecord;
use echobridge_domain::error::BridgeError;
use echobridge_domain::event::SemanticEvent;
use echobridge_domain::id::{DeviceId, HubId};

/// Wire-form message handed to a device sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkMessage {
    pub device: DeviceId,
    pub topic: String,
    pub payload: Value,
}

impl SinkMessage {
    /// Build the outbound message for `record`, applying its topic override.
    #[must_use]
    pub fn for_device(record: &DeviceRecord, event: &SemanticEvent) -> Self {
        let topic = record
            .topic
            .clone()
            .unwrap_or_else(|| event.topic().to_string());
        Self {
            device: record.id.clone(),
            topic,
            payload: event.payload_json(),
        }
    }
}

/// Snapshot view over the host environment's registered device records.
///
/// Implementations must tolerate concurrent calls from parallel request
/// handlers; the bridge never caches results across requests, so records
/// added or removed by the host show up on the next call.
pub trait DeviceSource: Send + Sync {
    /// Every record bound to `hub`, in the host's stable iteration order.
    fn devices(&self, hub: &HubId) -> Vec<DeviceRecord>;

    /// The live sink for a device id, if the host still has one.
    fn sink(&self, id: &DeviceId) -> Option<Arc<dyn DeviceSink>>;
}

/// Opaque downstream handler owned by the host environment.
///
/// Delivery is fire-and-forget from the protocol facades' perspective;
/// a rejection here is logged by the dispatch worker and goes no further.
pub trait DeviceSink: Send + Sync {
    /// Accept one delivered message.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Sink`] (or any wrapped error) when the
    /// handler rejects the event.
    fn receive(&self, message: SinkMessage) -> Result<(), BridgeError>;
}
