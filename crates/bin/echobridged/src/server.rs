//! Hub runtime — owns the TCP listener and the SSDP responder task.
//!
//! A hub runs two independent loops: HTTP accept-and-dispatch and the SSDP
//! receive/advertise loop. Both share one shutdown flag. The TCP bind is
//! fatal; the SSDP bind degrades to a discovery-less hub that still serves
//! direct directive POSTs.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use echobridge_adapter_ssdp::{SsdpConfig, SsdpResponder};
use echobridge_app::hub::{HubState, HubStatus};
use echobridge_domain::error::BridgeError;

/// Everything needed to bring a hub up.
pub struct HubSettings {
    /// `host:port` for the TCP listener.
    pub bind_addr: String,
    /// `None` disables discovery entirely.
    pub ssdp: Option<SsdpConfig>,
    /// HTTPS was asked for but cannot be served; report the fallback.
    pub https_requested: bool,
}

/// A running hub: both sockets bound, both loops live.
pub struct Hub {
    local_addr: SocketAddr,
    ssdp_addr: Option<SocketAddr>,
    state_tx: watch::Sender<HubState>,
    status_rx: watch::Receiver<HubStatus>,
    shutdown_tx: watch::Sender<bool>,
    http_task: JoinHandle<()>,
    ssdp_task: Option<JoinHandle<()>>,
}

impl Hub {
    /// Bind both sockets and start serving.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] when the TCP listener cannot be
    /// bound; the hub is then closed and will not recover.
    pub async fn start(router: Router, settings: HubSettings) -> Result<Self, BridgeError> {
        let (state_tx, _) = watch::channel(HubState::Initializing);
        let (status_tx, status_rx) = watch::channel(HubStatus::initializing());

        let listener = match TcpListener::bind(&settings.bind_addr).await {
            Ok(listener) => listener,
            Err(err) => {
                let _ = status_tx.send(HubStatus::error(&err));
                advance(&state_tx, HubState::Closed);
                tracing::error!(addr = %settings.bind_addr, error = %err, "TCP bind failed");
                return Err(BridgeError::Transport(err));
            }
        };
        let local_addr = listener.local_addr().map_err(BridgeError::Transport)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut ssdp_addr = None;
        let ssdp_task = match settings.ssdp {
            Some(config) => match SsdpResponder::bind(config, shutdown_rx.clone()).await {
                Ok(responder) => {
                    ssdp_addr = responder.local_addr().ok();
                    Some(tokio::spawn(responder.run()))
                }
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        "SSDP bind failed; discovery disabled, direct directive POSTs still served"
                    );
                    None
                }
            },
            None => None,
        };

        let mut http_shutdown = shutdown_rx;
        let http_task = tokio::spawn(async move {
            let shutdown = async move {
                while http_shutdown.changed().await.is_ok() {
                    if *http_shutdown.borrow() {
                        break;
                    }
                }
            };
            let service = router.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(err) = axum::serve(listener, service)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %err, "HTTP server failed");
            }
        });

        advance(&state_tx, HubState::Listening);
        let status = if settings.https_requested {
            HubStatus::http_fallback(local_addr.port())
        } else {
            HubStatus::listening(local_addr.port())
        };
        let _ = status_tx.send(status);

        Ok(Self {
            local_addr,
            ssdp_addr,
            state_tx,
            status_rx,
            shutdown_tx,
            http_task,
            ssdp_task,
        })
    }

    /// Address the HTTP listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Address the SSDP socket is bound to, when discovery is live.
    #[must_use]
    pub fn ssdp_addr(&self) -> Option<SocketAddr> {
        self.ssdp_addr
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HubState {
        *self.state_tx.borrow()
    }

    /// Subscribe to status signals for the host environment.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<HubStatus> {
        self.status_rx.clone()
    }

    /// Stop accepting work, wait out the grace period, then force-close.
    pub async fn close(self, grace: Duration) {
        advance(&self.state_tx, HubState::Closing);
        let _ = self.shutdown_tx.send(true);

        finish(self.http_task, grace, "HTTP").await;
        if let Some(task) = self.ssdp_task {
            finish(task, grace, "SSDP").await;
        }

        advance(&self.state_tx, HubState::Closed);
    }
}

fn advance(state: &watch::Sender<HubState>, next: HubState) {
    let current = *state.borrow();
    if current.can_transition_to(next) {
        // send_replace: the state must advance even with no subscribers
        state.send_replace(next);
    } else {
        tracing::error!(%current, %next, "illegal hub state transition");
    }
}

/// Wait for a loop to end on its own; abort it once the grace period is
/// spent.
async fn finish(task: JoinHandle<()>, grace: Duration, name: &str) {
    let abort = task.abort_handle();
    if tokio::time::timeout(grace, task).await.is_err() {
        tracing::warn!(task = name, "grace period elapsed, force-closing");
        abort.abort();
    }
}
