//! # echobridge-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the UPnP descriptor (`/description.xml`)
//! - Emulate the slice of the Hue v1 REST API an Echo exercises
//!   (pairing, config, lights, state PUTs)
//! - Accept Alexa Smart Home v3 directives at `/alexa`
//! - Apply the shared middleware: rate limiting, hardening headers,
//!   request deadline, body cap
//!
//! ## Dependency rule
//! Depends on `echobridge-app` (ports, registry view, dispatch) and
//! `echobridge-domain` (protocol mappings). Never leaks axum types into
//! the application layer.

pub mod alexa;
pub mod descriptor;
pub mod hue;
pub mod middleware;
pub mod router;
pub mod state;
