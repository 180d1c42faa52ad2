//! Registry view — dense per-hub indices over the host's device records.
//!
//! The view is not a store: it is recomputed from the [`DeviceSource`] on
//! every capture so hot redeploys in the host environment are picked up
//! immediately. Within one capture the ordering and indices are fixed,
//! which is what gives listings their consistency.

use echobridge_domain::device::DeviceRecord;
use echobridge_domain::id::HubId;

use crate::ports::DeviceSource;

/// One device as listed by the protocol facades.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedDevice {
    pub record: DeviceRecord,
    /// Dense 1-based position in the host's iteration order.
    pub index: usize,
    /// Synthetic Hue-style unique id, deterministic per (hub, index).
    pub unique_id: String,
}

/// Ordered snapshot of the devices bound to one hub.
#[derive(Debug, Clone)]
pub struct RegistryView {
    devices: Vec<ListedDevice>,
}

impl RegistryView {
    /// Capture a snapshot for `hub` from the host's registry source.
    pub fn capture<S: DeviceSource + ?Sized>(source: &S, hub: &HubId) -> Self {
        let devices = source
            .devices(hub)
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                let index = position + 1;
                ListedDevice {
                    unique_id: hub.unique_id(index),
                    index,
                    record,
                }
            })
            .collect();
        Self { devices }
    }

    /// The listed devices, indices `1..=len` in order.
    #[must_use]
    pub fn devices(&self) -> &[ListedDevice] {
        &self.devices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Resolve a token that may be a raw device id, a synthetic unique id,
    /// or a 1-based index rendered as a string. Raw ids win ties against
    /// index strings.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<&ListedDevice> {
        self.devices
            .iter()
            .find(|device| device.record.id.as_str() == token)
            .or_else(|| self.devices.iter().find(|device| device.unique_id == token))
            .or_else(|| {
                let index: usize = token.parse().ok()?;
                self.devices.iter().find(|device| device.index == index)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InMemoryDeviceSource, RecordingSink};
    use std::sync::Arc;

    fn hub() -> HubId {
        HubId::new("00112233445566778899aabbccddeeff").unwrap()
    }

    fn other_hub() -> HubId {
        HubId::new("ffeeddccbbaa99887766554433221100").unwrap()
    }

    fn source_with(names: &[(&str, &str)], hub: &HubId) -> InMemoryDeviceSource {
        let source = InMemoryDeviceSource::default();
        for (id, name) in names {
            let record = DeviceRecord::builder()
                .id(*id)
                .name(*name)
                .hub(hub.clone())
                .build()
                .unwrap();
            source.register(record, Arc::new(RecordingSink::default()));
        }
        source
    }

    #[test]
    fn should_list_only_devices_bound_to_the_hub() {
        let source = source_with(&[("d1", "One"), ("d2", "Two")], &hub());
        let stranger = DeviceRecord::builder()
            .id("x1")
            .name("Other")
            .hub(other_hub())
            .build()
            .unwrap();
        source.register(stranger, Arc::new(RecordingSink::default()));

        let view = RegistryView::capture(&source, &hub());
        assert_eq!(view.len(), 2);
        assert!(view.devices().iter().all(|d| d.record.hub == hub()));
    }

    #[test]
    fn should_assign_dense_one_based_indices_in_registration_order() {
        let source = source_with(&[("d1", "One"), ("d2", "Two"), ("d3", "Three")], &hub());
        let view = RegistryView::capture(&source, &hub());

        let indices: Vec<usize> = view.devices().iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        let ids: Vec<&str> = view
            .devices()
            .iter()
            .map(|d| d.record.id.as_str())
            .collect();
        assert_eq!(ids, vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn should_attach_deterministic_unique_ids() {
        let source = source_with(&[("d1", "One")], &hub());
        let first = RegistryView::capture(&source, &hub());
        let second = RegistryView::capture(&source, &hub());
        assert_eq!(
            first.devices()[0].unique_id,
            second.devices()[0].unique_id
        );
        assert_eq!(first.devices()[0].unique_id, hub().unique_id(1));
    }

    #[test]
    fn should_resolve_by_raw_id() {
        let source = source_with(&[("d1", "One"), ("d2", "Two")], &hub());
        let view = RegistryView::capture(&source, &hub());
        assert_eq!(view.resolve("d2").unwrap().record.id.as_str(), "d2");
    }

    #[test]
    fn should_resolve_by_unique_id() {
        let source = source_with(&[("d1", "One")], &hub());
        let view = RegistryView::capture(&source, &hub());
        let unique = view.devices()[0].unique_id.clone();
        assert_eq!(view.resolve(&unique).unwrap().record.id.as_str(), "d1");
    }

    #[test]
    fn should_resolve_by_index_string() {
        let source = source_with(&[("d1", "One"), ("d2", "Two")], &hub());
        let view = RegistryView::capture(&source, &hub());
        assert_eq!(view.resolve("2").unwrap().record.id.as_str(), "d2");
    }

    #[test]
    fn should_prefer_raw_id_over_index_string() {
        // "2" is both a raw id and the index of the second device
        let source = source_with(&[("2", "Literal Two"), ("d2", "Second")], &hub());
        let view = RegistryView::capture(&source, &hub());
        assert_eq!(view.resolve("2").unwrap().record.name, "Literal Two");
    }

    #[test]
    fn should_return_none_for_unknown_token() {
        let source = source_with(&[("d1", "One")], &hub());
        let view = RegistryView::capture(&source, &hub());
        assert!(view.resolve("ghost").is_none());
        assert!(view.resolve("999").is_none());
        assert!(view.resolve("0").is_none());
    }

    #[test]
    fn should_reflect_host_changes_on_next_capture() {
        let source = source_with(&[("d1", "One")], &hub());
        let before = RegistryView::capture(&source, &hub());
        assert_eq!(before.len(), 1);

        let record = DeviceRecord::builder()
            .id("d2")
            .name("Two")
            .hub(hub())
            .build()
            .unwrap();
        source.register(record, Arc::new(RecordingSink::default()));

        let after = RegistryView::capture(&source, &hub());
        assert_eq!(after.len(), 2);
        assert_eq!(after.devices()[1].index, 2);
    }
}
