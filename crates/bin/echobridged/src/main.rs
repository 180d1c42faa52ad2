//! # echobridged — echobridge daemon
//!
//! Composition root that wires the bridge together and runs it.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env vars)
//! - Resolve the hub identity and the host's primary address
//! - Build the static device table (the stand-in host environment)
//! - Assemble the axum router and the SSDP responder
//! - Run the hub until SIGTERM/Ctrl-C, then close it gracefully
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no protocol logic belongs here.

mod config;
mod server;

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use echobridge_adapter_http_axum::router;
use echobridge_adapter_http_axum::state::{AppState, BridgeContext};
use echobridge_adapter_ssdp::{BridgeIdentity, SsdpConfig};
use echobridge_app::dispatch::Dispatcher;
use echobridge_app::hub::StatusLevel;
use echobridge_app::ports::{DeviceSink, SinkMessage};
use echobridge_app::source::InMemoryDeviceSource;
use echobridge_domain::device::DeviceRecord;
use echobridge_domain::error::BridgeError;
use echobridge_domain::id::HubId;

use crate::config::Config;
use crate::server::{Hub, HubSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration
    let config = Config::load()?;

    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_filter()))
        .init();

    tracing::info!("configuration loaded");

    // Hub identity
    let hub_id = match &config.hub_id {
        Some(raw) => HubId::new(raw.clone())?,
        None => {
            let generated = uuid::Uuid::new_v4().simple().to_string();
            tracing::warn!(
                hub_id = %generated,
                "no hub_id configured; generated one, discovery identities change on restart"
            );
            HubId::new(generated)?
        }
    };

    // Device table
    let source = Arc::new(InMemoryDeviceSource::default());
    for entry in &config.devices {
        let mut builder = DeviceRecord::builder()
            .id(entry.id.clone())
            .name(entry.name.clone())
            .hub(hub_id.clone());
        if let Some(topic) = &entry.topic {
            builder = builder.topic(topic.clone());
        }
        match builder.build() {
            Ok(record) => {
                tracing::info!(device = %record.id, name = %record.name, "device registered");
                source.register(record, Arc::new(LogSink));
            }
            Err(err) => {
                // misconfigured devices are unusable but never fatal
                tracing::error!(device = %entry.id, error = %err, "device configuration invalid, skipping");
            }
        }
    }

    // HTTP
    let ip = primary_ipv4();
    let bridge = BridgeContext::new(hub_id.clone(), ip, config.server.port);
    let description_url = bridge.description_url();
    let state = AppState::new(bridge, source, Dispatcher::new());
    let app = router::build(state);

    // SSDP
    let ssdp = config.ssdp.enabled.then(|| {
        let mut ssdp_config = SsdpConfig::new(BridgeIdentity {
            uuid: hub_id.bridge_uuid(),
            bridge_id: hub_id.bridge_id(),
            location: description_url,
        });
        ssdp_config.ad_interval = Duration::from_secs(config.ssdp.ad_interval_secs);
        ssdp_config
    });
    if ssdp.is_none() {
        tracing::info!("SSDP disabled; serving the directive endpoint only");
    }

    let settings = HubSettings {
        bind_addr: config.bind_addr(),
        ssdp,
        https_requested: config.server.port == 443,
    };
    let hub = Hub::start(app, settings).await?;

    // Relay status signals to the log for the host
    let mut status = hub.status();
    tokio::spawn(async move {
        loop {
            let current = status.borrow_and_update().clone();
            match current.level {
                StatusLevel::Green => tracing::info!(status = %current.message, "hub status"),
                StatusLevel::Yellow => tracing::warn!(status = %current.message, "hub status"),
                StatusLevel::Red => tracing::error!(status = %current.message, "hub status"),
            }
            if status.changed().await.is_err() {
                break;
            }
        }
    });

    shutdown_signal().await;
    tracing::info!("shutting down");
    hub.close(Duration::from_secs(5)).await;
    tracing::info!("shutdown complete");
    Ok(())
}

/// The primary non-loopback IPv4 address, used in every URL the bridge
/// advertises.
fn primary_ipv4() -> IpAddr {
    match local_ip_address::local_ip() {
        Ok(ip) => ip,
        Err(err) => {
            tracing::warn!(error = %err, "could not determine primary address, falling back to loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

/// Sink that logs every delivered event; the downstream handler slot for
/// statically configured devices.
struct LogSink;

impl DeviceSink for LogSink {
    fn receive(&self, message: SinkMessage) -> Result<(), BridgeError> {
        tracing::info!(
            device = %message.device,
            topic = %message.topic,
            payload = %message.payload,
            "event delivered"
        );
        Ok(())
    }
}

/// Wait for a shutdown signal (Ctrl-C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
