//! UPnP descriptor — the document SSDP advertisements point at.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use echobridge_app::ports::DeviceSource;

use crate::state::{AppState, BridgeContext};

/// `GET /description.xml`.
///
/// Other verbs on the route answer 405 through the router's method
/// filtering.
pub async fn get_description<S>(State(state): State<AppState<S>>) -> Response
where
    S: DeviceSource + 'static,
{
    (
        [(header::CONTENT_TYPE, "text/xml")],
        render(&state.bridge),
    )
        .into_response()
}

fn render(bridge: &BridgeContext) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion>
    <major>1</major>
    <minor>0</minor>
  </specVersion>
  <URLBase>{url_base}</URLBase>
  <device>
    <deviceType>urn:schemas-upnp-org:device:PhilipsHueBridge:1</deviceType>
    <friendlyName>Philips hue ({ip})</friendlyName>
    <manufacturer>Royal Philips Electronics</manufacturer>
    <manufacturerURL>http://www.philips.com</manufacturerURL>
    <modelDescription>Philips hue Personal Wireless Lighting</modelDescription>
    <modelName>Philips hue bridge 2015</modelName>
    <modelNumber>BSB002</modelNumber>
    <modelURL>http://www.meethue.com</modelURL>
    <serialNumber>{serial}</serialNumber>
    <UDN>uuid:{uuid}</UDN>
  </device>
</root>
"#,
        url_base = bridge.url_base(),
        ip = bridge.ip,
        serial = bridge.hub_id.as_str(),
        uuid = bridge.hub_id.bridge_uuid(),
    )
}
