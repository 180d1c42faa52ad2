//! Axum router assembly.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use echobridge_app::ports::DeviceSource;

use crate::state::AppState;
use crate::{alexa, descriptor, hue, middleware};

/// Hard cap on request bodies; anything larger answers 413.
pub const MAX_BODY_BYTES: usize = 10 * 1024;

/// Build the top-level axum [`Router`].
///
/// Unmatched methods on matched routes answer 405 out of the box, which is
/// exactly what the descriptor route wants.
pub fn build<S>(state: AppState<S>) -> Router
where
    S: DeviceSource + 'static,
{
    Router::new()
        .route("/description.xml", get(descriptor::get_description::<S>))
        .route("/api", post(hue::pair::<S>))
        .route("/api/config", get(hue::get_config::<S>))
        .route("/api/{user}", get(hue::full_state::<S>))
        .route("/api/{user}/lights", get(hue::list_lights::<S>))
        .route("/api/{user}/lights/{id}", get(hue::get_light::<S>))
        .route(
            "/api/{user}/lights/{id}/state",
            put(hue::put_light_state::<S>),
        )
        .route("/alexa", post(alexa::handle::<S>))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit::<S>))
        .layer(from_fn(middleware::deadline))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
