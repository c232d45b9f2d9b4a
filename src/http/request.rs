//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) and echo it on the response
//! - Extract tenant-resolution inputs (host, path) from the request
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept, not replaced

use axum::http::{header, HeaderMap, HeaderName, Uri};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::tenant::resolver::RequestContext;

pub const X_REQUEST_ID: &str = "x-request-id";

fn request_id_header() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Sets `x-request-id` on requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(request_id_header(), MakeRequestUuid)
}

/// Copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(request_id_header())
}

/// Build a resolution context from the `Host` header and the full request path.
pub fn request_context(headers: &HeaderMap, uri: &Uri) -> RequestContext {
    let mut ctx = RequestContext::new().with_path(uri.path());
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.host());
    if let Some(host) = host {
        ctx = ctx.with_host(host);
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("Reef.Platform.com:8080"));
        let uri: Uri = "/clients/reef/api/tenant".parse().unwrap();

        let ctx = request_context(&headers, &uri);
        assert_eq!(ctx.hostname.as_deref(), Some("reef.platform.com"));
        assert_eq!(ctx.pathname.as_deref(), Some("/clients/reef/api/tenant"));
    }

    #[test]
    fn test_request_context_without_host() {
        let uri: Uri = "/api/tenant".parse().unwrap();
        let ctx = request_context(&HeaderMap::new(), &uri);
        assert_eq!(ctx.hostname, None);
    }
}
