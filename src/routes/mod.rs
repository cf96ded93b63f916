//! HTTP routes.
//!
//! The only route is `/healthz`, accepted for any method. Responses are
//! marked `no-store` so intermediaries never answer a probe from cache.
//!
//! Each probe is tagged with an `x-request-id` that is logged and echoed back.

pub mod health;

use axum::{routing::any, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::with_request_ids;
use crate::state::AppState;

/// Path the health handler is mounted on
pub const HEALTHZ_PATH: &str = "/healthz";

/// Cache-Control value for probe responses
pub const CACHE_CONTROL_HEALTHZ: &str = "no-store";

/// Creates the Axum router with the health route.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route(HEALTHZ_PATH, any(health::healthz))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTHZ),
        ))
        .with_state(state);

    with_request_ids(router)
}
