//! Shared application state for the axum handlers.

use std::net::IpAddr;
use std::sync::Arc;

use echobridge_app::dispatch::Dispatcher;
use echobridge_app::ports::DeviceSource;
use echobridge_domain::id::HubId;

use crate::middleware::RateLimiter;

/// Network identity of the bridge as advertised to clients.
#[derive(Debug, Clone)]
pub struct BridgeContext {
    pub hub_id: HubId,
    /// Primary non-loopback address of the host, used in every URL the
    /// bridge hands out.
    pub ip: IpAddr,
    pub port: u16,
}

impl BridgeContext {
    #[must_use]
    pub fn new(hub_id: HubId, ip: IpAddr, port: u16) -> Self {
        Self { hub_id, ip, port }
    }

    /// `https` exactly when the TLS port is configured; the transport the
    /// listener actually speaks is the binary's decision.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.port == 443 { "https" } else { "http" }
    }

    /// `URLBase` advertised in the UPnP descriptor.
    #[must_use]
    pub fn url_base(&self) -> String {
        format!("{}://{}:{}/", self.scheme(), self.ip, self.port)
    }

    /// Absolute descriptor URL, also used as the SSDP LOCATION.
    #[must_use]
    pub fn description_url(&self) -> String {
        format!("{}description.xml", self.url_base())
    }

    /// Username (and client key) issued by the pairing endpoint.
    #[must_use]
    pub fn api_username(&self) -> String {
        format!("node-red-alexa-{}", self.hub_id.as_str())
    }
}

/// Application state shared across all axum handlers.
///
/// Generic over the device source to avoid dynamic dispatch. `Clone` is
/// implemented manually so the source type itself does not need to be
/// `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<S> {
    pub bridge: Arc<BridgeContext>,
    pub source: Arc<S>,
    pub dispatcher: Dispatcher,
    pub limiter: Arc<RateLimiter>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            bridge: Arc::clone(&self.bridge),
            source: Arc::clone(&self.source),
            dispatcher: self.dispatcher.clone(),
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<S> AppState<S>
where
    S: DeviceSource + 'static,
{
    /// Create state with the default rate-limit policy.
    #[must_use]
    pub fn new(bridge: BridgeContext, source: Arc<S>, dispatcher: Dispatcher) -> Self {
        Self {
            bridge: Arc::new(bridge),
            source,
            dispatcher,
            limiter: Arc::new(RateLimiter::per_quarter_hour(100)),
        }
    }
}
