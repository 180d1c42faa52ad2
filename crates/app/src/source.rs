//! In-memory device source — the reference host-environment implementation.
//!
//! The daemon uses it to serve a statically configured device table, and
//! downstream crates use it (together with [`RecordingSink`]) as the test
//! double for the host registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use echobridge_domain::device::DeviceRecord;
use echobridge_domain::error::BridgeError;
use echobridge_domain::id::{DeviceId, HubId};

use crate::ports::{DeviceSink, DeviceSource, SinkMessage};

#[derive(Default)]
struct Inner {
    records: Vec<DeviceRecord>,
    sinks: HashMap<DeviceId, Arc<dyn DeviceSink>>,
}

/// Thread-safe in-memory registry of device records and sinks.
///
/// Registration order is the iteration order the registry view sees.
#[derive(Default)]
pub struct InMemoryDeviceSource {
    inner: Mutex<Inner>,
}

impl InMemoryDeviceSource {
    /// Register a record together with its sink. A record with an id that
    /// is already present replaces the previous registration in place.
    pub fn register(&self, record: DeviceRecord, sink: Arc<dyn DeviceSink>) {
        let mut inner = self.lock();
        inner.sinks.insert(record.id.clone(), sink);
        if let Some(existing) = inner.records.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
        } else {
            inner.records.push(record);
        }
    }

    /// Remove a device and its sink.
    pub fn remove(&self, id: &DeviceId) {
        let mut inner = self.lock();
        inner.records.retain(|record| &record.id != id);
        inner.sinks.remove(id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DeviceSource for InMemoryDeviceSource {
    fn devices(&self, hub: &HubId) -> Vec<DeviceRecord> {
        self.lock()
            .records
            .iter()
            .filter(|record| &record.hub == hub)
            .cloned()
            .collect()
    }

    fn sink(&self, id: &DeviceId) -> Option<Arc<dyn DeviceSink>> {
        self.lock().sinks.get(id).cloned()
    }
}

/// Sink that stores every received message, for assertions in tests.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<SinkMessage>>,
}

impl RecordingSink {
    /// Snapshot of the messages received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<SinkMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DeviceSink for RecordingSink {
    fn receive(&self, message: SinkMessage) -> Result<(), BridgeError> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> HubId {
        HubId::new("00112233445566778899aabbccddeeff").unwrap()
    }

    fn record(id: &str, name: &str) -> DeviceRecord {
        DeviceRecord::builder()
            .id(id)
            .name(name)
            .hub(hub())
            .build()
            .unwrap()
    }

    #[test]
    fn should_iterate_in_registration_order() {
        let source = InMemoryDeviceSource::default();
        for id in ["c", "a", "b"] {
            source.register(record(id, id), Arc::new(RecordingSink::default()));
        }
        let ids: Vec<String> = source
            .devices(&hub())
            .iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn should_replace_record_in_place_on_reregistration() {
        let source = InMemoryDeviceSource::default();
        source.register(record("d1", "Old"), Arc::new(RecordingSink::default()));
        source.register(record("d2", "Two"), Arc::new(RecordingSink::default()));
        source.register(record("d1", "New"), Arc::new(RecordingSink::default()));

        let devices = source.devices(&hub());
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "New");
        assert_eq!(devices[1].name, "Two");
    }

    #[test]
    fn should_remove_record_and_sink() {
        let source = InMemoryDeviceSource::default();
        source.register(record("d1", "One"), Arc::new(RecordingSink::default()));
        source.remove(&DeviceId::new("d1"));
        assert!(source.devices(&hub()).is_empty());
        assert!(source.sink(&DeviceId::new("d1")).is_none());
    }

    #[test]
    fn should_return_sink_for_registered_device() {
        let source = InMemoryDeviceSource::default();
        source.register(record("d1", "One"), Arc::new(RecordingSink::default()));
        assert!(source.sink(&DeviceId::new("d1")).is_some());
        assert!(source.sink(&DeviceId::new("ghost")).is_none());
    }
}
