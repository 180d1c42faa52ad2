//! # echobridge-adapter-ssdp
//!
//! SSDP responder: the UDP/multicast side of bridge discovery.
//!
//! ## Responsibilities
//! - Announce the bridge with periodic `NOTIFY ssdp:alive` beacons
//! - Answer `M-SEARCH` probes with unicast HTTP-over-UDP responses
//! - Say goodbye (`ssdp:byebye`) on shutdown
//!
//! The HTTP descriptor the advertisements point at is served by the axum
//! adapter; this crate only needs the final LOCATION URL and the bridge
//! identity strings.

pub mod message;
pub mod responder;

pub use message::{BridgeIdentity, DiscoveryTarget, SearchRequest};
pub use responder::{SsdpConfig, SsdpResponder};
