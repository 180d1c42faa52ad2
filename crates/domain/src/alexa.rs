//! Alexa Smart Home v3 directives and their mapping onto semantic events.
//!
//! The envelope types mirror the JSON a controller POSTs at the directive
//! endpoint. Mapping is pure; the HTTP adapter owns the response envelopes.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::event::{ColorValue, PowerState, SemanticEvent};

/// Inbound request envelope for the directive endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectiveEnvelope {
    pub directive: Directive,
}

/// A Smart Home v3 directive.
#[derive(Debug, Clone, Deserialize)]
pub struct Directive {
    pub header: Header,
    #[serde(default)]
    pub endpoint: Option<Endpoint>,
    #[serde(default)]
    pub payload: Value,
}

impl Directive {
    /// Whether this is the `Alexa.Discovery.Discover` request.
    #[must_use]
    pub fn is_discovery(&self) -> bool {
        self.header.namespace == "Alexa.Discovery" && self.header.name == "Discover"
    }

    /// The addressed endpoint id, when one was supplied.
    #[must_use]
    pub fn endpoint_id(&self) -> Option<&str> {
        self.endpoint
            .as_ref()
            .and_then(|endpoint| endpoint.endpoint_id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub namespace: String,
    pub name: String,
    #[serde(default, rename = "messageId")]
    pub message_id: Option<String>,
    #[serde(default, rename = "correlationToken")]
    pub correlation_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    #[serde(default, rename = "endpointId")]
    pub endpoint_id: Option<String>,
}

/// Context property reported back for a successful control directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedProperty {
    pub namespace: &'static str,
    pub name: &'static str,
    pub value: Value,
}

/// A control directive translated into its event and report.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedDirective {
    pub event: SemanticEvent,
    pub property: ReportedProperty,
}

/// Why a directive could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("Unsupported directive: {namespace}.{name}")]
    Unsupported { namespace: String, name: String },
    #[error("Missing or malformed payload for {namespace}.{name}")]
    InvalidPayload { namespace: String, name: String },
}

/// Map a control directive onto a semantic event plus the property to
/// report. The reported value always equals the delivered payload.
pub fn map_directive(directive: &Directive) -> Result<MappedDirective, DirectiveError> {
    let namespace = directive.header.namespace.as_str();
    let name = directive.header.name.as_str();

    match (namespace, name) {
        ("Alexa.PowerController", "TurnOn") => Ok(power(PowerState::On)),
        ("Alexa.PowerController", "TurnOff") => Ok(power(PowerState::Off)),
        ("Alexa.BrightnessController", "SetBrightness") => {
            let value = directive
                .payload
                .get("brightness")
                .and_then(Value::as_i64)
                .ok_or_else(|| invalid_payload(directive))?;
            Ok(brightness(value.clamp(0, 100)))
        }
        ("Alexa.BrightnessController", "AdjustBrightness") => {
            // deltas pass through unclamped; no state to combine with
            let delta = directive
                .payload
                .get("brightnessDelta")
                .and_then(Value::as_i64)
                .ok_or_else(|| invalid_payload(directive))?;
            Ok(brightness(delta))
        }
        ("Alexa.ColorController", "SetColor") => {
            let color = directive
                .payload
                .get("color")
                .ok_or_else(|| invalid_payload(directive))?;
            let component = |key: &str| color.get(key).and_then(Value::as_f64);
            let (Some(hue), Some(saturation), Some(brightness)) = (
                component("hue"),
                component("saturation"),
                component("brightness"),
            ) else {
                return Err(invalid_payload(directive));
            };

            let event = SemanticEvent::Color(ColorValue::Hsb {
                hue,
                saturation,
                brightness,
            });
            let value = event.payload_json();
            Ok(MappedDirective {
                event,
                property: ReportedProperty {
                    namespace: "Alexa.ColorController",
                    name: "color",
                    value,
                },
            })
        }
        _ => Err(DirectiveError::Unsupported {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }),
    }
}

fn power(state: PowerState) -> MappedDirective {
    MappedDirective {
        event: SemanticEvent::Power(state),
        property: ReportedProperty {
            namespace: "Alexa.PowerController",
            name: "powerState",
            value: json!(state.as_str()),
        },
    }
}

fn brightness(value: i64) -> MappedDirective {
    MappedDirective {
        event: SemanticEvent::Brightness(value),
        property: ReportedProperty {
            namespace: "Alexa.BrightnessController",
            name: "brightness",
            value: json!(value),
        },
    }
}

fn invalid_payload(directive: &Directive) -> DirectiveError {
    DirectiveError::InvalidPayload {
        namespace: directive.header.namespace.clone(),
        name: directive.header.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(namespace: &str, name: &str, payload: Value) -> Directive {
        Directive {
            header: Header {
                namespace: namespace.to_string(),
                name: name.to_string(),
                message_id: Some("m1".to_string()),
                correlation_token: None,
            },
            endpoint: Some(Endpoint {
                endpoint_id: Some("d1".to_string()),
            }),
            payload,
        }
    }

    #[test]
    fn should_parse_full_envelope() {
        let body = r#"{
            "directive": {
                "header": {
                    "namespace": "Alexa.BrightnessController",
                    "name": "SetBrightness",
                    "messageId": "m1",
                    "correlationToken": "c1"
                },
                "endpoint": {"endpointId": "d1"},
                "payload": {"brightness": 42}
            }
        }"#;
        let envelope: DirectiveEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.directive.header.name, "SetBrightness");
        assert_eq!(envelope.directive.endpoint_id(), Some("d1"));
        assert_eq!(
            envelope.directive.header.correlation_token.as_deref(),
            Some("c1")
        );
    }

    #[test]
    fn should_detect_discovery_directive() {
        let d = directive("Alexa.Discovery", "Discover", json!({}));
        assert!(d.is_discovery());
        assert!(!directive("Alexa.PowerController", "TurnOn", json!({})).is_discovery());
    }

    #[test]
    fn should_map_turn_on_to_power_on() {
        let mapped = map_directive(&directive("Alexa.PowerController", "TurnOn", json!({}))).unwrap();
        assert_eq!(mapped.event, SemanticEvent::Power(PowerState::On));
        assert_eq!(mapped.property.name, "powerState");
        assert_eq!(mapped.property.value, json!("ON"));
    }

    #[test]
    fn should_map_turn_off_to_power_off() {
        let mapped =
            map_directive(&directive("Alexa.PowerController", "TurnOff", json!({}))).unwrap();
        assert_eq!(mapped.event, SemanticEvent::Power(PowerState::Off));
        assert_eq!(mapped.property.value, json!("OFF"));
    }

    #[test]
    fn should_map_set_brightness() {
        let mapped = map_directive(&directive(
            "Alexa.BrightnessController",
            "SetBrightness",
            json!({"brightness": 42}),
        ))
        .unwrap();
        assert_eq!(mapped.event, SemanticEvent::Brightness(42));
        assert_eq!(mapped.property.value, json!(42));
    }

    #[test]
    fn should_clamp_set_brightness_to_bounds() {
        let mapped = map_directive(&directive(
            "Alexa.BrightnessController",
            "SetBrightness",
            json!({"brightness": 150}),
        ))
        .unwrap();
        assert_eq!(mapped.event, SemanticEvent::Brightness(100));
    }

    #[test]
    fn should_pass_adjust_brightness_delta_through_unclamped() {
        let mapped = map_directive(&directive(
            "Alexa.BrightnessController",
            "AdjustBrightness",
            json!({"brightnessDelta": -120}),
        ))
        .unwrap();
        assert_eq!(mapped.event, SemanticEvent::Brightness(-120));
        assert_eq!(mapped.property.value, json!(-120));
    }

    #[test]
    fn should_map_set_color_to_hsb() {
        let mapped = map_directive(&directive(
            "Alexa.ColorController",
            "SetColor",
            json!({"color": {"hue": 350.5, "saturation": 0.7138, "brightness": 0.6524}}),
        ))
        .unwrap();
        assert_eq!(
            mapped.property.value,
            json!({"hue": 350.5, "saturation": 0.7138, "brightness": 0.6524})
        );
    }

    #[test]
    fn should_reject_set_color_without_color_payload() {
        let result = map_directive(&directive("Alexa.ColorController", "SetColor", json!({})));
        assert!(matches!(result, Err(DirectiveError::InvalidPayload { .. })));
    }

    #[test]
    fn should_reject_set_brightness_without_value() {
        let result = map_directive(&directive(
            "Alexa.BrightnessController",
            "SetBrightness",
            json!({}),
        ));
        assert!(matches!(result, Err(DirectiveError::InvalidPayload { .. })));
    }

    #[test]
    fn should_reject_unsupported_directive_with_names_in_message() {
        let err = map_directive(&directive("Alexa.ThermostatController", "SetTargetTemperature", json!({})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported directive: Alexa.ThermostatController.SetTargetTemperature"
        );
    }

    #[test]
    fn should_report_value_equal_to_delivered_payload() {
        let cases = [
            directive("Alexa.PowerController", "TurnOn", json!({})),
            directive(
                "Alexa.BrightnessController",
                "SetBrightness",
                json!({"brightness": 42}),
            ),
            directive(
                "Alexa.ColorController",
                "SetColor",
                json!({"color": {"hue": 10.0, "saturation": 0.5, "brightness": 0.5}}),
            ),
        ];
        for case in cases {
            let mapped = map_directive(&case).unwrap();
            assert_eq!(mapped.property.value, mapped.event.payload_json());
        }
    }
}
