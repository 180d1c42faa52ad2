//! Semantic events — the normalized internal command form.
//!
//! Every inbound control (Hue PUT or Alexa directive) is translated into one
//! of these variants before it reaches a device sink. The free-form
//! `{topic, payload}` JSON shape exists only at the wire boundary, via
//! [`SemanticEvent::topic`] and [`SemanticEvent::payload_json`].

use serde_json::{json, Value};

/// Power command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// Color command payload, spanning the three color models the bridge
/// accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorValue {
    /// Hue/saturation/brightness. `hue` keeps the scale of its source
    /// (0–65535 from Hue PUTs, 0–360 from Alexa directives).
    Hsb {
        hue: f64,
        saturation: f64,
        brightness: f64,
    },
    /// CIE xy chromaticity.
    Xy { xy: [f64; 2], brightness: f64 },
    /// Mired color temperature.
    Ct { ct: u16, brightness: f64 },
}

/// The normalized command delivered to a device sink.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticEvent {
    Power(PowerState),
    /// Absolute percentage for set operations, signed delta for adjusts.
    Brightness(i64),
    Color(ColorValue),
}

impl SemanticEvent {
    /// The semantic topic a sink sees unless the device overrides it.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::Power(_) => "power",
            Self::Brightness(_) => "brightness",
            Self::Color(_) => "color",
        }
    }

    /// Wire-form payload for delivery and for Alexa context reporting.
    #[must_use]
    pub fn payload_json(&self) -> Value {
        match self {
            Self::Power(state) => json!(state.as_str()),
            Self::Brightness(value) => json!(value),
            Self::Color(ColorValue::Hsb {
                hue,
                saturation,
                brightness,
            }) => json!({
                "hue": integer_preserving(*hue),
                "saturation": saturation,
                "brightness": brightness,
            }),
            Self::Color(ColorValue::Xy { xy, brightness }) => json!({
                "xy": xy,
                "brightness": brightness,
            }),
            Self::Color(ColorValue::Ct { ct, brightness }) => json!({
                "ct": ct,
                "brightness": brightness,
            }),
        }
    }
}

/// Hue PUTs carry `hue` as an integer; keep it one on the way out instead
/// of re-encoding as `40000.0`.
fn integer_preserving(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        json!(value as i64)
    } else {
        json!(value)
    }
}
