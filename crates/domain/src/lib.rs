//! # echobridge-domain
//!
//! Core types for the bridge emulator: hub and device identifiers, device
//! records, semantic events, and the Hue/Alexa protocol mappings.
//!
//! ## Responsibilities
//! - Define the normalized [`event::SemanticEvent`] delivered to device sinks
//! - Map Hue light-state bodies and Alexa Smart Home directives onto events
//! - Derive the bridge identities (UUID, bridge id, per-device unique ids)
//!   from the host-assigned hub id
//!
//! ## Dependency rule
//! No I/O and no internal dependencies. Everything here is pure and
//! deterministic; sockets and HTTP live in the adapter crates.

pub mod alexa;
pub mod device;
pub mod error;
pub mod event;
pub mod hue;
pub mod id;
pub mod sanitize;
pub mod time;
