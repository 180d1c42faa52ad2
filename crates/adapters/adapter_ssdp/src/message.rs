//! SSDP wire messages — parsing M-SEARCH probes and rendering
//! advertisements and search responses.

/// SERVER header value advertised by the bridge.
pub const SERVER_SIGNATURE: &str = "Linux/3.14.0 UPnP/1.0 PhilipsHue/1.0";

const ROOT_DEVICE: &str = "upnp:rootdevice";
const BASIC_DEVICE: &str = "urn:schemas-upnp-org:device:basic:1";
const HUE_BRIDGE: &str = "urn:schemas-upnp-org:device:PhilipsHueBridge:1";
const HUE_BRIDGE_LEGACY: &str = "urn:philips-hue:device:bridge:1";

/// Identity block stamped into every outbound SSDP message.
#[derive(Debug, Clone)]
pub struct BridgeIdentity {
    /// Bridge UUID without the `uuid:` prefix.
    pub uuid: String,
    /// Uppercase bridge id for the `hue-bridgeid` / `BRIDGEID` headers.
    pub bridge_id: String,
    /// Absolute URL of the UPnP descriptor.
    pub location: String,
}

/// The advertisement lines a Hue bridge announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryTarget {
    RootDevice,
    BasicDevice,
    HueBridge,
    BridgeUuid,
}

impl DiscoveryTarget {
    /// Every line, in the order they are advertised.
    pub const ALL: [Self; 4] = [
        Self::RootDevice,
        Self::BasicDevice,
        Self::HueBridge,
        Self::BridgeUuid,
    ];

    /// The `NT`/`ST` value for this line.
    #[must_use]
    pub fn notification_type(self, identity: &BridgeIdentity) -> String {
        match self {
            Self::RootDevice => ROOT_DEVICE.to_string(),
            Self::BasicDevice => BASIC_DEVICE.to_string(),
            Self::HueBridge => HUE_BRIDGE.to_string(),
            Self::BridgeUuid => format!("uuid:{}", identity.uuid),
        }
    }

    /// The `USN` value for this line.
    #[must_use]
    pub fn usn(self, identity: &BridgeIdentity) -> String {
        match self {
            Self::BridgeUuid => format!("uuid:{}", identity.uuid),
            other => format!("uuid:{}::{}", identity.uuid, other.notification_type(identity)),
        }
    }
}

/// A parsed M-SEARCH probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub st: String,
    /// Seconds the searcher is willing to wait for responses.
    pub mx: u64,
}

/// Parse a datagram as an M-SEARCH request.
///
/// Returns `None` for anything that is not an M-SEARCH (NOTIFYs from other
/// devices arrive on the same multicast group constantly).
#[must_use]
pub fn parse_search(datagram: &[u8]) -> Option<SearchRequest> {
    let text = std::str::from_utf8(datagram).ok()?;
    let mut lines = text.lines();

    if lines.next()?.trim() != "M-SEARCH * HTTP/1.1" {
        return None;
    }

    let mut st = None;
    let mut mx = None;
    for line in lines {
        let line = line.trim();
        if let Some(value) = extract_header_value(line, "ST:") {
            st = Some(value);
        } else if let Some(value) = extract_header_value(line, "MX:") {
            mx = value.parse().ok();
        }
    }

    Some(SearchRequest {
        st: st?,
        mx: mx.unwrap_or(1),
    })
}

/// Extract a header value from a line like `HEADER: value`, matching the
/// header name case-insensitively.
fn extract_header_value(line: &str, header: &str) -> Option<String> {
    if line.len() > header.len() && line[..header.len()].eq_ignore_ascii_case(header) {
        Some(line[header.len()..].trim().to_string())
    } else {
        None
    }
}

/// Whether the bridge answers probes for this search target.
#[must_use]
pub fn matches_search_target(st: &str) -> bool {
    st.eq_ignore_ascii_case("ssdp:all")
        || st.eq_ignore_ascii_case(ROOT_DEVICE)
        || st.eq_ignore_ascii_case(BASIC_DEVICE)
        || st.eq_ignore_ascii_case(HUE_BRIDGE)
        || st.eq_ignore_ascii_case(HUE_BRIDGE_LEGACY)
}

/// The lines to include in a reply for a matched search target:
/// `ssdp:all` gets one response per advertised line, a specific target
/// gets exactly the line it asked for.
#[must_use]
pub fn response_targets(st: &str) -> Vec<DiscoveryTarget> {
    if st.eq_ignore_ascii_case("ssdp:all") {
        DiscoveryTarget::ALL.to_vec()
    } else if st.eq_ignore_ascii_case(ROOT_DEVICE) {
        vec![DiscoveryTarget::RootDevice]
    } else if st.eq_ignore_ascii_case(BASIC_DEVICE) {
        vec![DiscoveryTarget::BasicDevice]
    } else if st.eq_ignore_ascii_case(HUE_BRIDGE) || st.eq_ignore_ascii_case(HUE_BRIDGE_LEGACY) {
        vec![DiscoveryTarget::HueBridge]
    } else {
        Vec::new()
    }
}

/// Render one `NOTIFY ssdp:alive` advertisement.
#[must_use]
pub fn render_alive(identity: &BridgeIdentity, target: DiscoveryTarget, group: &str) -> String {
    format!(
        "NOTIFY * HTTP/1.1\r\n\
         HOST: {group}\r\n\
         CACHE-CONTROL: max-age=100\r\n\
         LOCATION: {location}\r\n\
         SERVER: {server}\r\n\
         NTS: ssdp:alive\r\n\
         hue-bridgeid: {bridge_id}\r\n\
         BRIDGEID: {bridge_id}\r\n\
         NT: {nt}\r\n\
         USN: {usn}\r\n\
         \r\n",
        location = identity.location,
        server = SERVER_SIGNATURE,
        bridge_id = identity.bridge_id,
        nt = target.notification_type(identity),
        usn = target.usn(identity),
    )
}

/// Render one `NOTIFY ssdp:byebye` farewell.
#[must_use]
pub fn render_byebye(identity: &BridgeIdentity, target: DiscoveryTarget, group: &str) -> String {
    format!(
        "NOTIFY * HTTP/1.1\r\n\
         HOST: {group}\r\n\
         NTS: ssdp:byebye\r\n\
         NT: {nt}\r\n\
         USN: {usn}\r\n\
         \r\n",
        nt = target.notification_type(identity),
        usn = target.usn(identity),
    )
}

/// Render one HTTP-over-UDP response to an M-SEARCH probe.
#[must_use]
pub fn render_search_response(identity: &BridgeIdentity, target: DiscoveryTarget) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         CACHE-CONTROL: max-age=100\r\n\
         EXT:\r\n\
         LOCATION: {location}\r\n\
         SERVER: {server}\r\n\
         hue-bridgeid: {bridge_id}\r\n\
         BRIDGEID: {bridge_id}\r\n\
         ST: {st}\r\n\
         USN: {usn}\r\n\
         \r\n",
        location = identity.location,
        server = SERVER_SIGNATURE,
        bridge_id = identity.bridge_id,
        st = target.notification_type(identity),
        usn = target.usn(identity),
    )
}
