//! Error responses.
//!
//! # Responsibilities
//! - Map tenant and content errors to HTTP status codes
//! - Render a uniform JSON body: `{ "error", "code", "details"? }`
//!
//! # Design Decisions
//! - Schema violations are returned in full; operators fix documents from them
//! - I/O failures never leak filesystem details to clients

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::content::error::{ContentError, Issue};
use crate::tenant::context::ContextError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<Issue>>,
}

/// Failure while serving a tenant request.
#[derive(Debug)]
pub enum ApiError {
    /// No strategy matched and no fallback slug is configured.
    NoTenant,
    UnknownSection(String),
    Tenant(Arc<ContextError>),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoTenant | ApiError::UnknownSection(_) => StatusCode::NOT_FOUND,
            ApiError::Tenant(e) => match e.as_ref() {
                ContextError::MissingSlug => StatusCode::NOT_FOUND,
                ContextError::Content(e) => content_status(e),
            },
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::NoTenant => ErrorBody {
                error: "No tenant matched this request".to_string(),
                code: "no_tenant",
                details: None,
            },
            ApiError::UnknownSection(section) => ErrorBody {
                error: format!("Unknown section '{section}'"),
                code: "unknown_section",
                details: None,
            },
            ApiError::Tenant(e) => match e.as_ref() {
                ContextError::MissingSlug => ErrorBody {
                    error: e.to_string(),
                    code: "no_tenant",
                    details: None,
                },
                ContextError::Content(e) => content_body(e),
            },
        }
    }
}

fn content_status(error: &ContentError) -> StatusCode {
    match error {
        ContentError::TenantNotFound { .. } => StatusCode::NOT_FOUND,
        ContentError::InvalidSlug(_) => StatusCode::BAD_REQUEST,
        ContentError::InvalidConfiguration { .. }
        | ContentError::Parse { .. }
        | ContentError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn content_body(error: &ContentError) -> ErrorBody {
    let (message, details) = match error {
        ContentError::TenantNotFound { slug, .. } => (format!("Tenant '{slug}' not found"), None),
        ContentError::InvalidConfiguration { slug, source } => (
            format!("Invalid configuration for tenant '{slug}'"),
            Some(source.issues().to_vec()),
        ),
        ContentError::Io { slug, .. } => (
            format!("Failed to read configuration for tenant '{slug}'"),
            None,
        ),
        other => (other.to_string(), None),
    };
    ErrorBody {
        error: message,
        code: error.code(),
        details,
    }
}

impl From<ContentError> for ApiError {
    fn from(e: ContentError) -> Self {
        ApiError::Tenant(Arc::new(ContextError::Content(e)))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = ?self, "Tenant request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::validator::validate;
    use crate::tenant::slug::TenantSlug;

    #[test]
    fn test_not_found_mapping() {
        let err = ApiError::from(ContentError::TenantNotFound {
            slug: "ghost".into(),
            path: "/srv/ghost/config.json".into(),
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let body = err.body();
        assert_eq!(body.code, "tenant_not_found");
        assert!(!body.error.contains("/srv"));
    }

    #[test]
    fn test_invalid_slug_is_bad_request() {
        let slug_err = TenantSlug::new("Bad Slug").unwrap_err();
        let err = ApiError::from(ContentError::from(slug_err));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body().code, "invalid_slug");
    }

    #[test]
    fn test_invalid_configuration_lists_issues() {
        let violation = validate(&serde_json::json!({})).unwrap_err();
        let count = violation.issues().len();
        let err = ApiError::from(ContentError::InvalidConfiguration {
            slug: "reef".into(),
            source: violation,
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body.code, "invalid_configuration");
        assert_eq!(body.details.map(|d| d.len()), Some(count));
    }

    #[test]
    fn test_io_hides_source() {
        let err = ApiError::from(ContentError::Io {
            slug: "reef".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/secret/path"),
        });
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["code"], "io_error");
        assert!(!json["error"].as_str().unwrap().contains("/secret"));
        assert!(json.get("details").is_none());
    }
}
