//! Request spans.
//!
//! Every HTTP request gets one span carrying its request ID, so events
//! emitted while resolving and loading a tenant correlate to the request.

use axum::http::Request;
use tracing::Span;

use crate::http::X_REQUEST_ID;

/// Span for `TraceLayer::make_span_with`.
pub fn request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        tenant = tracing::field::Empty,
    )
}

/// Attach the resolved tenant to the current request span.
pub fn record_tenant(slug: &str) {
    Span::current().record("tenant", slug);
}
