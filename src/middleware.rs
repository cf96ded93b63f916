//! Request correlation for health checks.
//!
//! Every request gets an `x-request-id`: the caller's own if it sent one,
//! otherwise a fresh UUID. The id is echoed on the response so a load
//! balancer's failed check can be matched to the log line it produced.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response, Router};
use http::HeaderName;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Instrument;

/// Header carrying the request id
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Wrap `router` so each request is assigned an id, logged under it, and
/// answered with it.
pub fn with_request_ids(router: Router) -> Router {
    // Last layer runs first: the id is set before the span reads it
    router
        .layer(axum::middleware::from_fn(request_span))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

/// Runs the request inside a span keyed by its request id and logs the
/// outcome once the response is ready.
async fn request_span(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    span.record("duration_ms", duration_ms);
    span.in_scope(|| {
        tracing::info!(status = response.status().as_u16(), duration_ms, "Health check answered");
    });

    response
}
