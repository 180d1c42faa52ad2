//! SSDP responder — multicast presence beacons and unicast M-SEARCH
//! replies.
//!
//! One socket, one task: the run loop multiplexes the periodic alive
//! beacon, inbound datagrams, and the shutdown flag. Replies to probes are
//! spawned separately because each waits out its own random delay.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};

use crate::message::{
    self, BridgeIdentity, DiscoveryTarget, SearchRequest,
};

/// Well-known SSDP port.
pub const SSDP_PORT: u16 = 1900;

/// SSDP multicast group.
pub const MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Searchers never wait longer than this, whatever their MX says.
const MAX_MX_SECS: u64 = 3;

/// Responder settings.
#[derive(Debug, Clone)]
pub struct SsdpConfig {
    pub identity: BridgeIdentity,
    /// UDP port to bind; anything but [`SSDP_PORT`] only makes sense in
    /// tests.
    pub port: u16,
    /// Cadence of the alive beacon.
    pub ad_interval: Duration,
}

impl SsdpConfig {
    #[must_use]
    pub fn new(identity: BridgeIdentity) -> Self {
        Self {
            identity,
            port: SSDP_PORT,
            ad_interval: Duration::from_secs(30),
        }
    }
}

/// Bound SSDP responder, ready to run.
pub struct SsdpResponder {
    socket: Arc<UdpSocket>,
    config: SsdpConfig,
    shutdown: watch::Receiver<bool>,
}

impl SsdpResponder {
    /// Bind the UDP socket and join the SSDP multicast group.
    ///
    /// A failed multicast join is logged and tolerated — unicast probes and
    /// beacons still work on most interfaces — but a failed bind is returned
    /// to the caller, who decides whether the hub survives without
    /// discovery.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the socket cannot be bound.
    pub async fn bind(
        config: SsdpConfig,
        shutdown: watch::Receiver<bool>,
    ) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.port)).await?;
        if let Err(err) = socket.join_multicast_v4(MULTICAST_ADDR, Ipv4Addr::UNSPECIFIED) {
            tracing::warn!(
                error = %err,
                "could not join SSDP multicast group; unicast search replies still served"
            );
        }

        Ok(Self {
            socket: Arc::new(socket),
            config,
            shutdown,
        })
    }

    /// Local address of the bound socket.
    ///
    /// # Errors
    ///
    /// Propagates the I/O error when the socket has no local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve until the shutdown flag flips, then send byebye farewells.
    pub async fn run(self) {
        let Self {
            socket,
            config,
            mut shutdown,
        } = self;
        let group = SocketAddr::from((MULTICAST_ADDR, config.port));

        let mut beacons = interval(config.ad_interval);
        beacons.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut buf = [0u8; 1536];
        loop {
            tokio::select! {
                _ = beacons.tick() => send_alive(&socket, &config.identity, group).await,
                received = socket.recv_from(&mut buf) => match received {
                    Ok((len, src)) => handle_search(&socket, &config.identity, &buf[..len], src),
                    Err(err) => tracing::warn!(error = %err, "SSDP receive failed"),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        send_byebye(&socket, &config.identity, group).await;
        tracing::debug!("SSDP responder stopped");
    }
}

async fn send_alive(socket: &UdpSocket, identity: &BridgeIdentity, group: SocketAddr) {
    let group_header = group.to_string();
    for target in DiscoveryTarget::ALL {
        let advertisement = message::render_alive(identity, target, &group_header);
        if let Err(err) = socket.send_to(advertisement.as_bytes(), group).await {
            tracing::warn!(error = %err, "failed to send SSDP alive advertisement");
            return;
        }
    }
    tracing::trace!("sent SSDP alive advertisements");
}

async fn send_byebye(socket: &UdpSocket, identity: &BridgeIdentity, group: SocketAddr) {
    let group_header = group.to_string();
    for target in DiscoveryTarget::ALL {
        let farewell = message::render_byebye(identity, target, &group_header);
        if let Err(err) = socket.send_to(farewell.as_bytes(), group).await {
            tracing::debug!(error = %err, "failed to send SSDP byebye");
            return;
        }
    }
}

fn handle_search(
    socket: &Arc<UdpSocket>,
    identity: &BridgeIdentity,
    datagram: &[u8],
    src: SocketAddr,
) {
    let Some(request) = message::parse_search(datagram) else {
        return;
    };
    if !message::matches_search_target(&request.st) {
        return;
    }

    tracing::debug!(%src, st = %request.st, mx = request.mx, "answering M-SEARCH");
    let targets = message::response_targets(&request.st);
    tokio::spawn(reply_after_jitter(
        Arc::clone(socket),
        identity.clone(),
        targets,
        request,
        src,
    ));
}

/// Wait a uniform random share of the searcher's MX window, then reply.
/// A reply that would land past the window is dropped instead of sent late.
async fn reply_after_jitter(
    socket: Arc<UdpSocket>,
    identity: BridgeIdentity,
    targets: Vec<DiscoveryTarget>,
    request: SearchRequest,
    src: SocketAddr,
) {
    let window = Duration::from_secs(request.mx.min(MAX_MX_SECS));
    let deadline = Instant::now() + window;

    if !window.is_zero() {
        let delay = rand::thread_rng().gen_range(0.0..window.as_secs_f64());
        sleep(Duration::from_secs_f64(delay)).await;
    }
    if Instant::now() > deadline {
        tracing::debug!(%src, "dropping M-SEARCH reply past its MX window");
        return;
    }

    for target in targets {
        let response = message::render_search_response(&identity, target);
        if let Err(err) = socket.send_to(response.as_bytes(), src).await {
            tracing::warn!(error = %err, %src, "failed to send M-SEARCH reply");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn identity() -> BridgeIdentity {
        BridgeIdentity {
            uuid: "2f402f80-da50-11e1-9b23-001122334455".to_string(),
            bridge_id: "00112233445566778899AABBCCDDEEFF".to_string(),
            location: "http://127.0.0.1:8080/description.xml".to_string(),
        }
    }

    fn test_config() -> SsdpConfig {
        let mut config = SsdpConfig::new(identity());
        // ephemeral port and a long beacon interval keep tests quiet
        config.port = 0;
        config.ad_interval = Duration::from_secs(3600);
        config
    }

    async fn recv_text(socket: &UdpSocket) -> Option<String> {
        let mut buf = [0u8; 2048];
        match timeout(Duration::from_secs(4), socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => Some(String::from_utf8_lossy(&buf[..len]).to_string()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn should_reply_to_m_search_within_the_mx_window() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let responder = SsdpResponder::bind(test_config(), shutdown_rx)
            .await
            .unwrap();
        let port = responder.local_addr().unwrap().port();
        tokio::spawn(responder.run());

        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let probe = b"M-SEARCH * HTTP/1.1\r\n\
            HOST: 239.255.255.250:1900\r\n\
            MAN: \"ssdp:discover\"\r\n\
            MX: 2\r\n\
            ST: upnp:rootdevice\r\n\
            \r\n";
        client
            .send_to(probe, (Ipv4Addr::LOCALHOST, port))
            .await
            .unwrap();

        let reply = recv_text(&client).await.expect("reply within MX window");
        assert!(reply.starts_with("HTTP/1.1 200 OK"));
        assert!(reply.contains("ST: upnp:rootdevice"));
        assert!(reply.contains("hue-bridgeid: 00112233445566778899AABBCCDDEEFF"));
        assert!(reply.contains("LOCATION: http://127.0.0.1:8080/description.xml"));
    }

    #[tokio::test]
    async fn should_reply_identically_to_repeated_probes() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let responder = SsdpResponder::bind(test_config(), shutdown_rx)
            .await
            .unwrap();
        let port = responder.local_addr().unwrap().port();
        tokio::spawn(responder.run());

        let probe = b"M-SEARCH * HTTP/1.1\r\nMX: 1\r\nST: upnp:rootdevice\r\n\r\n";
        let mut replies = Vec::new();
        for _ in 0..2 {
            let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
            client
                .send_to(probe, (Ipv4Addr::LOCALHOST, port))
                .await
                .unwrap();
            replies.push(recv_text(&client).await.expect("reply"));
        }

        let usn = |reply: &str| {
            reply
                .lines()
                .find(|line| line.starts_with("USN:"))
                .map(str::to_string)
        };
        let location = |reply: &str| {
            reply
                .lines()
                .find(|line| line.starts_with("LOCATION:"))
                .map(str::to_string)
        };
        assert_eq!(usn(&replies[0]), usn(&replies[1]));
        assert_eq!(location(&replies[0]), location(&replies[1]));
    }

    #[tokio::test]
    async fn should_ignore_unrelated_search_targets() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let responder = SsdpResponder::bind(test_config(), shutdown_rx)
            .await
            .unwrap();
        let port = responder.local_addr().unwrap().port();
        tokio::spawn(responder.run());

        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let probe =
            b"M-SEARCH * HTTP/1.1\r\nMX: 1\r\nST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\r\n";
        client
            .send_to(probe, (Ipv4Addr::LOCALHOST, port))
            .await
            .unwrap();

        let mut buf = [0u8; 512];
        let outcome = timeout(Duration::from_millis(1500), client.recv_from(&mut buf)).await;
        assert!(outcome.is_err(), "no reply expected");
    }

    #[tokio::test]
    async fn should_stop_replying_after_shutdown() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let responder = SsdpResponder::bind(test_config(), shutdown_rx)
            .await
            .unwrap();
        let port = responder.local_addr().unwrap().port();
        let handle = tokio::spawn(responder.run());

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("responder task ends")
            .unwrap();

        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let probe = b"M-SEARCH * HTTP/1.1\r\nMX: 1\r\nST: upnp:rootdevice\r\n\r\n";
        client
            .send_to(probe, (Ipv4Addr::LOCALHOST, port))
            .await
            .unwrap();

        let mut buf = [0u8; 512];
        let outcome = timeout(Duration::from_secs(1), client.recv_from(&mut buf)).await;
        assert!(outcome.is_err(), "socket is closed, no reply expected");
    }
}
