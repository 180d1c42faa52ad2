//! # echobridge-app
//!
//! Application layer: the ports the host environment implements, the
//! per-hub registry view, the dispatch core, and hub lifecycle types.
//!
//! ## Responsibilities
//! - Define [`ports::DeviceSource`] / [`ports::DeviceSink`] (driven ports)
//! - Compute the ordered, indexed device view the protocol facades serve
//! - Deliver semantic events to sinks without blocking request handlers
//! - Model the hub lifecycle and its host-facing status signals
//!
//! ## Dependency rule
//! Depends only on `echobridge-domain`. Never references axum or socket
//! types; those live in the adapter crates.

pub mod dispatch;
pub mod hub;
pub mod ports;
pub mod registry;
pub mod source;
