//! Alexa Smart Home v3 directive endpoint.
//!
//! A single POST route accepts the `{directive: {...}}` envelope. Every
//! failure mode maps to a native `ErrorResponse`; nothing propagates to the
//! framework. `messageId` and `correlationToken` are echoed whenever the
//! request carried them.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use echobridge_app::dispatch::DispatchOutcome;
use echobridge_app::ports::DeviceSource;
use echobridge_app::registry::{ListedDevice, RegistryView};
use echobridge_domain::alexa::{map_directive, DirectiveEnvelope, ReportedProperty};
use echobridge_domain::sanitize::strip_html;
use echobridge_domain::time::{iso_millis, now};

use crate::state::AppState;

const INVALID_DIRECTIVE: &str = "INVALID_DIRECTIVE";
const ENDPOINT_UNREACHABLE: &str = "ENDPOINT_UNREACHABLE";
const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// `POST /alexa`.
pub async fn handle<S>(State(state): State<AppState<S>>, body: Bytes) -> Response
where
    S: DeviceSource + 'static,
{
    let (status, body) = process(&state, &body);
    (status, Json(body)).into_response()
}

fn process<S>(state: &AppState<S>, body: &[u8]) -> (StatusCode, Value)
where
    S: DeviceSource + 'static,
{
    let Ok(raw) = serde_json::from_slice::<Value>(body) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            INVALID_DIRECTIVE,
            "Malformed directive envelope",
            "unknown",
            None,
            None,
        );
    };

    let Ok(envelope) = serde_json::from_value::<DirectiveEnvelope>(raw.clone()) else {
        // salvage the ids for the echo even when the envelope is broken
        let message_id = raw
            .pointer("/directive/header/messageId")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let correlation = raw
            .pointer("/directive/header/correlationToken")
            .and_then(Value::as_str)
            .map(str::to_string);
        return error_response(
            StatusCode::BAD_REQUEST,
            INVALID_DIRECTIVE,
            "Missing or malformed directive",
            &message_id,
            correlation.as_deref(),
            None,
        );
    };

    let directive = envelope.directive;
    let message_id = directive
        .header
        .message_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let correlation = directive.header.correlation_token.clone();

    if directive.is_discovery() {
        let view = RegistryView::capture(state.source.as_ref(), &state.bridge.hub_id);
        tracing::debug!(endpoints = view.len(), "discovery request");
        return (StatusCode::OK, discovery_response(&view, &message_id));
    }

    let Some(endpoint_id) = directive.endpoint_id() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            INVALID_DIRECTIVE,
            "Missing endpointId",
            &message_id,
            correlation.as_deref(),
            None,
        );
    };

    let view = RegistryView::capture(state.source.as_ref(), &state.bridge.hub_id);
    let Some(device) = view.resolve(endpoint_id) else {
        return error_response(
            StatusCode::NOT_FOUND,
            ENDPOINT_UNREACHABLE,
            &format!("Unknown endpoint: {endpoint_id}"),
            &message_id,
            correlation.as_deref(),
            Some(endpoint_id),
        );
    };

    let mapped = match map_directive(&directive) {
        Ok(mapped) => mapped,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                INVALID_DIRECTIVE,
                &err.to_string(),
                &message_id,
                correlation.as_deref(),
                Some(endpoint_id),
            );
        }
    };

    tracing::debug!(
        endpoint = endpoint_id,
        topic = mapped.event.topic(),
        "directive accepted"
    );
    match state
        .dispatcher
        .dispatch(state.source.as_ref(), &device.record, &mapped.event)
    {
        DispatchOutcome::Delivered => {}
        DispatchOutcome::NotFound => {
            return error_response(
                StatusCode::NOT_FOUND,
                ENDPOINT_UNREACHABLE,
                &format!("Unknown endpoint: {endpoint_id}"),
                &message_id,
                correlation.as_deref(),
                Some(endpoint_id),
            );
        }
    }

    (
        StatusCode::OK,
        control_response(
            &mapped.property,
            endpoint_id,
            &message_id,
            correlation.as_deref(),
        ),
    )
}

fn header_json(
    namespace: &str,
    name: &str,
    message_id: &str,
    correlation: Option<&str>,
) -> Value {
    let mut header = json!({
        "namespace": namespace,
        "name": name,
        "payloadVersion": "3",
        "messageId": message_id,
    });
    if let Some(token) = correlation {
        header["correlationToken"] = json!(token);
    }
    header
}

fn error_response(
    status: StatusCode,
    error_type: &str,
    message: &str,
    message_id: &str,
    correlation: Option<&str>,
    endpoint_id: Option<&str>,
) -> (StatusCode, Value) {
    let mut event = json!({
        "header": header_json("Alexa", "ErrorResponse", message_id, correlation),
        "payload": {
            "type": error_type,
            "message": message,
        }
    });
    if let Some(endpoint_id) = endpoint_id {
        event["endpoint"] = json!({ "endpointId": endpoint_id });
    }
    (status, json!({ "event": event }))
}

/// The `INTERNAL_ERROR` envelope; also used by the deadline middleware.
#[must_use]
pub fn internal_error_body(message: &str) -> Value {
    let (_, body) = error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_ERROR,
        message,
        "unknown",
        None,
        None,
    );
    body
}

fn discovery_response(view: &RegistryView, message_id: &str) -> Value {
    let endpoints: Vec<Value> = view.devices().iter().map(discovery_endpoint).collect();
    json!({
        "event": {
            "header": header_json("Alexa.Discovery", "Discover.Response", message_id, None),
            "payload": {
                "endpoints": endpoints,
            }
        }
    })
}

fn discovery_endpoint(device: &ListedDevice) -> Value {
    json!({
        "endpointId": device.record.id.as_str(),
        "manufacturerName": "echobridge",
        "friendlyName": strip_html(&device.record.name),
        "description": "Virtual device connected via echobridge",
        "displayCategories": ["LIGHT", "SWITCH"],
        "cookie": {},
        "capabilities": [
            {
                "type": "AlexaInterface",
                "interface": "Alexa",
                "version": "3",
            },
            capability("Alexa.PowerController", "powerState"),
            capability("Alexa.BrightnessController", "brightness"),
            capability("Alexa.ColorController", "color"),
        ],
    })
}

fn capability(interface: &str, property: &str) -> Value {
    json!({
        "type": "AlexaInterface",
        "interface": interface,
        "version": "3",
        "properties": {
            "supported": [{ "name": property }],
            "proactivelyReported": false,
            "retrievable": false,
        }
    })
}

fn control_response(
    property: &ReportedProperty,
    endpoint_id: &str,
    message_id: &str,
    correlation: Option<&str>,
) -> Value {
    json!({
        "context": {
            "properties": [{
                "namespace": property.namespace,
                "name": property.name,
                "value": property.value,
                "timeOfSample": iso_millis(now()),
                "uncertaintyInMilliseconds": 0,
            }]
        },
        "event": {
            "header": header_json("Alexa", "Response", message_id, correlation),
            "endpoint": { "endpointId": endpoint_id },
            "payload": {},
        }
    })
}
