//! Dispatch core — delivers semantic events to device sinks without
//! blocking the request path.
//!
//! Deliveries go through a single background worker fed by an unbounded
//! queue. The worker preserves enqueue order, which gives per-connection
//! ordering for free, and a slow or blocking sink only ever stalls the
//! worker, never an HTTP handler.

use std::sync::Arc;

use tokio::sync::mpsc;

use echobridge_domain::device::DeviceRecord;
use echobridge_domain::event::SemanticEvent;

use crate::ports::{DeviceSink, DeviceSource, SinkMessage};

/// Outcome reported to the protocol adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event was queued for delivery.
    Delivered,
    /// The host has no sink registered for the device.
    NotFound,
}

struct Delivery {
    sink: Arc<dyn DeviceSink>,
    message: SinkMessage,
}

/// Hands deliveries to a background worker; callers never wait on a sink.
#[derive(Clone)]
pub struct Dispatcher {
    queue: mpsc::UnboundedSender<Delivery>,
}

impl Dispatcher {
    /// Spawn the delivery worker on the current tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        let (queue, mut deliveries) = mpsc::unbounded_channel::<Delivery>();
        tokio::spawn(async move {
            while let Some(delivery) = deliveries.recv().await {
                if let Err(err) = delivery.sink.receive(delivery.message.clone()) {
                    // fire-and-forget: the caller already got its response
                    tracing::warn!(
                        device = %delivery.message.device,
                        topic = %delivery.message.topic,
                        error = %err,
                        "device sink rejected event"
                    );
                }
            }
        });
        Self { queue }
    }

    /// Queue `event` for the device behind `record`.
    ///
    /// Returns [`DispatchOutcome::NotFound`] when the host no longer has a
    /// sink for the device (removed between resolve and dispatch).
    pub fn dispatch<S: DeviceSource + ?Sized>(
        &self,
        source: &S,
        record: &DeviceRecord,
        event: &SemanticEvent,
    ) -> DispatchOutcome {
        let Some(sink) = source.sink(&record.id) else {
            return DispatchOutcome::NotFound;
        };

        let message = SinkMessage::for_device(record, event);
        tracing::debug!(device = %message.device, topic = %message.topic, "dispatching event");

        if self.queue.send(Delivery { sink, message }).is_err() {
            // only possible during shutdown, once the worker is gone
            tracing::warn!(device = %record.id, "delivery worker gone, event dropped");
        }
        DispatchOutcome::Delivered
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InMemoryDeviceSource, RecordingSink};
    use echobridge_domain::error::BridgeError;
    use echobridge_domain::event::PowerState;
    use echobridge_domain::id::HubId;
    use std::time::Duration;

    fn hub() -> HubId {
        HubId::new("00112233445566778899aabbccddeeff").unwrap()
    }

    fn record(id: &str) -> DeviceRecord {
        DeviceRecord::builder()
            .id(id)
            .name("Lamp")
            .hub(hub())
            .build()
            .unwrap()
    }

    async fn drain(sink: &RecordingSink, expected: usize) -> Vec<SinkMessage> {
        for _ in 0..100 {
            if sink.messages().len() >= expected {
                return sink.messages();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        sink.messages()
    }

    #[tokio::test]
    async fn should_deliver_event_to_registered_sink() {
        let source = InMemoryDeviceSource::default();
        let sink = Arc::new(RecordingSink::default());
        source.register(record("d1"), sink.clone());

        let dispatcher = Dispatcher::new();
        let outcome = dispatcher.dispatch(
            &source,
            &record("d1"),
            &SemanticEvent::Power(PowerState::On),
        );
        assert_eq!(outcome, DispatchOutcome::Delivered);

        let messages = drain(&sink, 1).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].topic, "power");
        assert_eq!(messages[0].payload, serde_json::json!("ON"));
    }

    #[tokio::test]
    async fn should_report_not_found_for_unknown_device() {
        let source = InMemoryDeviceSource::default();
        let dispatcher = Dispatcher::new();
        let outcome = dispatcher.dispatch(
            &source,
            &record("ghost"),
            &SemanticEvent::Power(PowerState::Off),
        );
        assert_eq!(outcome, DispatchOutcome::NotFound);
    }

    #[tokio::test]
    async fn should_preserve_enqueue_order_per_sink() {
        let source = InMemoryDeviceSource::default();
        let sink = Arc::new(RecordingSink::default());
        source.register(record("d1"), sink.clone());

        let dispatcher = Dispatcher::new();
        for value in 0..10 {
            dispatcher.dispatch(&source, &record("d1"), &SemanticEvent::Brightness(value));
        }

        let messages = drain(&sink, 10).await;
        let values: Vec<i64> = messages
            .iter()
            .map(|m| m.payload.as_i64().unwrap())
            .collect();
        assert_eq!(values, (0..10).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn should_swallow_sink_rejections() {
        struct RejectingSink;
        impl crate::ports::DeviceSink for RejectingSink {
            fn receive(&self, _message: SinkMessage) -> Result<(), BridgeError> {
                Err(BridgeError::Sink("busy".into()))
            }
        }

        let source = InMemoryDeviceSource::default();
        source.register(record("d1"), Arc::new(RejectingSink));

        let dispatcher = Dispatcher::new();
        let outcome = dispatcher.dispatch(
            &source,
            &record("d1"),
            &SemanticEvent::Power(PowerState::On),
        );
        // the caller still sees success; the rejection is logged and dropped
        assert_eq!(outcome, DispatchOutcome::Delivered);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
