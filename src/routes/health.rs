//! Health check endpoint for load balancers and orchestrators.
//!
//! Each request pings Redis once. The endpoint reports Redis liveness, not
//! just that this process can answer HTTP.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Health check handler.
///
/// Returns 200 with the PING reply when Redis answers, 503 with the error
/// text otherwise. Request method, body and query are ignored.
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, String) {
    match state.cache.ping().await {
        Ok(reply) => (StatusCode::OK, format!("{reply}\n")),
        Err(e) => {
            tracing::warn!(error = %e, "Redis probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("ServiceUnavailable: {e}\n"),
            )
        }
    }
}
