//! Hue v1 light-state bodies and their mapping onto semantic events.
//!
//! A PUT body may carry any subset of the recognized keys. Exactly one
//! mapping rule wins, in a fixed precedence order; the keys that rule
//! consumed drive the success response the facade renders.

use serde::Deserialize;

use crate::event::{ColorValue, SemanticEvent};

/// Subset of the Hue light-state PUT body the bridge understands.
///
/// Unknown keys (`transitiontime`, `effect`, …) are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HueState {
    pub on: Option<bool>,
    pub bri: Option<u16>,
    pub hue: Option<u16>,
    pub sat: Option<u16>,
    pub xy: Option<[f64; 2]>,
    pub ct: Option<u16>,
}

impl HueState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of mapping a PUT body: the event to deliver plus the body keys
/// the winning rule consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedState {
    pub event: SemanticEvent,
    pub consumed: Vec<&'static str>,
}

/// Map a state body onto a semantic event. First match wins:
///
/// 1. `on`
/// 2. `bri` without `hue`/`sat`
/// 3. `hue` + `sat`
/// 4. `xy`
/// 5. `ct`
///
/// Returns `None` when no rule matches; the caller answers with the Hue
/// invalid-parameters error and delivers nothing.
#[must_use]
pub fn map_state(state: &HueState) -> Option<MappedState> {
    if let Some(on) = state.on {
        return Some(MappedState {
            event: SemanticEvent::Power(on.into()),
            consumed: vec!["on"],
        });
    }

    if let Some(bri) = state.bri {
        if state.hue.is_none() && state.sat.is_none() {
            return Some(MappedState {
                event: SemanticEvent::Brightness(brightness_percent(bri)),
                consumed: vec!["bri"],
            });
        }
    }

    if let (Some(hue), Some(sat)) = (state.hue, state.sat) {
        let mut consumed = vec!["hue", "sat"];
        if state.bri.is_some() {
            consumed.push("bri");
        }
        return Some(MappedState {
            event: SemanticEvent::Color(ColorValue::Hsb {
                hue: f64::from(hue),
                saturation: f64::from(sat.min(254)) / 254.0,
                brightness: brightness_component(state.bri),
            }),
            consumed,
        });
    }

    if let Some(xy) = state.xy {
        let mut consumed = vec!["xy"];
        if state.bri.is_some() {
            consumed.push("bri");
        }
        return Some(MappedState {
            event: SemanticEvent::Color(ColorValue::Xy {
                xy,
                brightness: brightness_component(state.bri),
            }),
            consumed,
        });
    }

    if let Some(ct) = state.ct {
        let mut consumed = vec!["ct"];
        if state.bri.is_some() {
            consumed.push("bri");
        }
        return Some(MappedState {
            event: SemanticEvent::Color(ColorValue::Ct {
                ct,
                brightness: brightness_component(state.bri),
            }),
            consumed,
        });
    }

    None
}

/// Hue 0–254 brightness to a whole percentage, clamped to `[0, 100]`.
#[must_use]
pub fn brightness_percent(bri: u16) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let percent = (f64::from(bri) / 254.0 * 100.0).round() as i64;
    percent.clamp(0, 100)
}

/// Brightness component carried alongside color payloads; a missing `bri`
/// means full brightness.
fn brightness_component(bri: Option<u16>) -> f64 {
    f64::from(bri.unwrap_or(254).min(254)) / 254.0
}
