//! Hue v1 REST facade — the slice of the bridge API an Echo exercises.
//!
//! Light objects are generated, never stored: the bridge tracks no light
//! state, so every GET answers the same defaults. Error and success bodies
//! are bit-exact Hue shapes; Echo validates them.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

use echobridge_app::dispatch::DispatchOutcome;
use echobridge_app::ports::DeviceSource;
use echobridge_app::registry::{ListedDevice, RegistryView};
use echobridge_domain::hue::{map_state, HueState};
use echobridge_domain::sanitize::strip_html;

use crate::state::{AppState, BridgeContext};

/// Software version reported for the bridge and every light.
pub const SW_VERSION: &str = "5.105.0.21169";

const API_VERSION: &str = "1.16.0";

/// `POST /api` — the permissive pairing handshake.
///
/// The body (`devicetype` and friends) is accepted and ignored; every
/// caller gets the same whitelist entry.
pub async fn pair<S>(State(state): State<AppState<S>>, _body: Bytes) -> Json<Value>
where
    S: DeviceSource + 'static,
{
    let username = state.bridge.api_username();
    tracing::debug!(%username, "pairing request");
    Json(json!([{
        "success": {
            "username": username,
            "clientkey": username,
        }
    }]))
}

/// `GET /api/config` — unauthenticated bridge config.
pub async fn get_config<S>(State(state): State<AppState<S>>) -> Json<Value>
where
    S: DeviceSource + 'static,
{
    Json(bridge_config(&state.bridge))
}

/// `GET /api/{user}` — full datastore dump.
///
/// Everything an Echo does not need is an empty object; the whitelist
/// always contains the caller.
pub async fn full_state<S>(
    State(state): State<AppState<S>>,
    Path(user): Path<String>,
) -> Json<Value>
where
    S: DeviceSource + 'static,
{
    let view = RegistryView::capture(state.source.as_ref(), &state.bridge.hub_id);

    let mut config = bridge_config(&state.bridge);
    let mut whitelist = Map::new();
    whitelist.insert(user.clone(), json!({ "name": user }));
    config["whitelist"] = Value::Object(whitelist);

    Json(json!({
        "lights": lights_object(&view),
        "groups": {},
        "config": config,
        "schedules": {},
        "scenes": {},
        "rules": {},
        "sensors": {},
        "resourcelinks": {},
    }))
}

/// `GET /api/{user}/lights` — all lights, keyed by their dense indices.
pub async fn list_lights<S>(State(state): State<AppState<S>>) -> Json<Value>
where
    S: DeviceSource + 'static,
{
    let view = RegistryView::capture(state.source.as_ref(), &state.bridge.hub_id);
    Json(lights_object(&view))
}

/// `GET /api/{user}/lights/{id}` — one light.
pub async fn get_light<S>(
    State(state): State<AppState<S>>,
    Path((_user, id)): Path<(String, String)>,
) -> Response
where
    S: DeviceSource + 'static,
{
    let view = RegistryView::capture(state.source.as_ref(), &state.bridge.hub_id);
    match view.resolve(&id) {
        Some(device) => Json(light_object(device)).into_response(),
        None => not_found(&format!("/lights/{id}")),
    }
}

/// `PUT /api/{user}/lights/{id}/state` — the control path.
///
/// The body is mapped onto a semantic event; the success array reports the
/// keys the winning rule consumed, in the order they appeared in the
/// request.
pub async fn put_light_state<S>(
    State(state): State<AppState<S>>,
    Path((_user, id)): Path<(String, String)>,
    body: Bytes,
) -> Response
where
    S: DeviceSource + 'static,
{
    let state_address = format!("/lights/{id}/state");

    let Some(object) = parse_state_object(&body) else {
        return invalid_parameters(&state_address);
    };

    let view = RegistryView::capture(state.source.as_ref(), &state.bridge.hub_id);
    let Some(device) = view.resolve(&id) else {
        return not_found(&format!("/lights/{id}"));
    };

    let Ok(hue_state) = serde_json::from_value::<HueState>(Value::Object(object.clone())) else {
        return invalid_parameters(&state_address);
    };
    let Some(mapped) = map_state(&hue_state) else {
        return invalid_parameters(&state_address);
    };

    tracing::debug!(device = %device.record.id, topic = mapped.event.topic(), "hue state PUT");
    match state
        .dispatcher
        .dispatch(state.source.as_ref(), &device.record, &mapped.event)
    {
        DispatchOutcome::Delivered => {}
        DispatchOutcome::NotFound => return not_found(&format!("/lights/{id}")),
    }

    // one success entry per consumed key, in request-body order
    let successes: Vec<Value> = object
        .iter()
        .filter(|(key, _)| mapped.consumed.contains(&key.as_str()))
        .map(|(key, value)| {
            let mut entry = Map::new();
            entry.insert(format!("{state_address}/{key}"), value.clone());
            json!({ "success": entry })
        })
        .collect();

    Json(Value::Array(successes)).into_response()
}

/// Parse a PUT body into a non-empty JSON object.
fn parse_state_object(body: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) if !object.is_empty() => Some(object),
        _ => None,
    }
}

/// The generated light object: fixed defaults, nothing is tracked.
pub(crate) fn light_object(device: &ListedDevice) -> Value {
    json!({
        "state": {
            "on": false,
            "bri": 254,
            "hue": 0,
            "sat": 254,
            "effect": "none",
            "xy": [0.0, 0.0],
            "ct": 199,
            "alert": "none",
            "colormode": "ct",
            "mode": "homeautomation",
            "reachable": true,
        },
        "type": "Extended color light",
        "name": strip_html(&device.record.name),
        "modelid": "LCT015",
        "manufacturername": "Signify",
        "productname": "Hue color lamp",
        "uniqueid": device.unique_id,
        "swversion": SW_VERSION,
    })
}

fn lights_object(view: &RegistryView) -> Value {
    let mut lights = Map::new();
    for device in view.devices() {
        lights.insert(device.index.to_string(), light_object(device));
    }
    Value::Object(lights)
}

fn bridge_config(bridge: &BridgeContext) -> Value {
    json!({
        "name": "Philips hue",
        "apiversion": API_VERSION,
        "swversion": SW_VERSION,
        "mac": bridge.hub_id.mac_address(),
        "bridgeid": bridge.hub_id.bridge_id(),
        "factorynew": false,
        "replacesbridgeid": null,
        "modelid": "BSB002",
        "starterkitid": "",
        "ipaddress": bridge.ip.to_string(),
    })
}

fn not_found(address: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(error_body(1, address, &format!("resource, {address}, not available"))),
    )
        .into_response()
}

fn invalid_parameters(address: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(error_body(6, address, "invalid parameters")),
    )
        .into_response()
}

fn error_body(error_type: u8, address: &str, description: &str) -> Value {
    json!([{
        "error": {
            "type": error_type,
            "address": address,
            "description": description,
        }
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use echobridge_domain::device::DeviceRecord;
    use echobridge_domain::id::HubId;
    use std::net::{IpAddr, Ipv4Addr};

    fn hub() -> HubId {
        HubId::new("00112233445566778899aabbccddeeff").unwrap()
    }

    fn listed(name: &str) -> ListedDevice {
        ListedDevice {
            record: DeviceRecord::builder()
                .id("d1")
                .name(name)
                .hub(hub())
                .build()
                .unwrap(),
            index: 1,
            unique_id: hub().unique_id(1),
        }
    }

    #[test]
    fn should_generate_light_object_with_default_state() {
        let light = light_object(&listed("Kitchen Lamp"));
        assert_eq!(light["state"]["on"], json!(false));
        assert_eq!(light["state"]["bri"], json!(254));
        assert_eq!(light["state"]["colormode"], json!("ct"));
        assert_eq!(light["state"]["mode"], json!("homeautomation"));
        assert_eq!(light["state"]["reachable"], json!(true));
        assert_eq!(light["type"], json!("Extended color light"));
        assert_eq!(light["modelid"], json!("LCT015"));
        assert_eq!(light["manufacturername"], json!("Signify"));
        assert_eq!(light["name"], json!("Kitchen Lamp"));
        assert_eq!(
            light["uniqueid"],
            json!("0011:2233:4455:6677:8899:aabb:ccdd:01-01")
        );
    }

    #[test]
    fn should_sanitize_light_names() {
        let light = light_object(&listed("<b>Desk</b> Lamp"));
        assert_eq!(light["name"], json!("Desk Lamp"));
    }

    #[test]
    fn should_render_hue_error_shape() {
        let body = error_body(1, "/lights/9", "resource, /lights/9, not available");
        assert_eq!(body[0]["error"]["type"], json!(1));
        assert_eq!(body[0]["error"]["address"], json!("/lights/9"));
    }

    #[test]
    fn should_report_bridge_identity_in_config() {
        let bridge = BridgeContext::new(
            hub(),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50)),
            80,
        );
        let config = bridge_config(&bridge);
        assert_eq!(config["bridgeid"], json!("00112233445566778899AABBCCDDEEFF"));
        assert_eq!(config["mac"], json!("00:11:22:33:44:55"));
        assert_eq!(config["ipaddress"], json!("192.168.1.50"));
        assert_eq!(config["modelid"], json!("BSB002"));
    }

    #[test]
    fn should_reject_non_object_state_bodies() {
        assert!(parse_state_object(b"[]").is_none());
        assert!(parse_state_object(b"{}").is_none());
        assert!(parse_state_object(b"not json").is_none());
        assert!(parse_state_object(b"42").is_none());
        assert!(parse_state_object(br#"{"on":true}"#).is_some());
    }
}
