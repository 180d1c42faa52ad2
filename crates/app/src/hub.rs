//! Hub lifecycle states and host-facing status signals.
//!
//! The runtime that owns the sockets lives in the binary crate; this module
//! only models the legal state transitions and the traffic-light status the
//! host environment renders.

use std::fmt;

/// Lifecycle of a hub's network personality.
///
/// ```text
/// Initializing -> Listening -> Closing -> Closed
///       \______________________________/
///                 (bind failure)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
    Initializing,
    Listening,
    Closing,
    Closed,
}

impl HubState {
    /// Whether the lifecycle may move from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initializing, Self::Listening)
                | (Self::Initializing, Self::Closed)
                | (Self::Listening, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }
}

impl fmt::Display for HubState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initializing => "initializing",
            Self::Listening => "listening",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Severity of a [`HubStatus`] signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Green,
    Yellow,
    Red,
}

/// Traffic-light status reported to the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubStatus {
    pub level: StatusLevel,
    pub message: String,
}

impl HubStatus {
    /// Sockets not bound yet.
    #[must_use]
    pub fn initializing() -> Self {
        Self {
            level: StatusLevel::Yellow,
            message: "initializing".to_string(),
        }
    }

    /// Both sockets bound; the hub is serving.
    #[must_use]
    pub fn listening(port: u16) -> Self {
        Self {
            level: StatusLevel::Green,
            message: format!("listening on {port}"),
        }
    }

    /// HTTPS was requested but no TLS material is available; serving
    /// plain HTTP instead.
    #[must_use]
    pub fn http_fallback(port: u16) -> Self {
        Self {
            level: StatusLevel::Yellow,
            message: format!("HTTP fallback on {port}"),
        }
    }

    /// The hub failed and will not recover without a restart.
    #[must_use]
    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            level: StatusLevel::Red,
            message: format!("error: {message}"),
        }
    }
}
