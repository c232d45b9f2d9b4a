//! HTTP and admin API tests, driven in-process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tenant_content::admin::setup_admin_router;
use tenant_content::config::ServiceConfig;
use tenant_content::content::{ConfigCache, ConfigLoader};
use tenant_content::http::{AppState, HttpServer};
use tenant_content::tenant::ResolutionStrategy;

mod common;
use common::{document_for, ContentDir, SAMPLE_SLUG};

const API_KEY: &str = "test-admin-key";

struct Harness {
    content: ContentDir,
    loader: Arc<ConfigLoader>,
    app: Router,
    admin: Router,
}

fn harness() -> Harness {
    let content = ContentDir::new();
    content.write_tenant(SAMPLE_SLUG);

    let mut config = ServiceConfig::default();
    config.content.base_path = content.path().to_path_buf();
    config.resolver.strategy = ResolutionStrategy::Domain;
    config.resolver.fallback_strategies = vec![ResolutionStrategy::Path];
    config
        .resolver
        .domain_map
        .insert("osdiving.com".into(), SAMPLE_SLUG.into());
    config
        .resolver
        .domain_map
        .insert("broken.example".into(), "broken".into());
    config.admin.api_key = API_KEY.into();

    let loader = Arc::new(ConfigLoader::new());
    let state = AppState::new(&config, Arc::clone(&loader));
    Harness {
        app: HttpServer::new(&config, state.clone()).router(),
        admin: setup_admin_router(state),
        loader,
        content,
    }
}

fn get(uri: &str, host: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(host) = host {
        builder = builder.header(header::HOST, host);
    }
    builder.body(Body::empty()).unwrap()
}

fn admin(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let (status, body) = send(&h.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_tenant_by_domain() {
    let h = harness();
    let (status, body) = send(&h.app, get("/api/tenant", Some("osdiving.com"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant"]["slug"], SAMPLE_SLUG);
    assert_eq!(body["branding"]["colors"]["primary"], "#0A7BC4");
    assert_eq!(h.loader.cache().len(), 1);
}

#[tokio::test]
async fn test_tenant_by_path_fallback_strategy() {
    let h = harness();
    let uri = format!("/clients/{SAMPLE_SLUG}/api/tenant/company");
    let (status, body) = send(&h.app, get(&uri, Some("unknown.example"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ocean Spirit Diving");
}

#[tokio::test]
async fn test_sections() {
    let h = harness();
    let (status, body) = send(&h.app, get("/api/tenant/courses", Some("osdiving.com"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&h.app, get("/api/tenant/diveSites", Some("osdiving.com"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "stella-maru");

    let (status, body) = send(&h.app, get("/api/tenant/secrets", Some("osdiving.com"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "unknown_section");
}

#[tokio::test]
async fn test_utilities() {
    let h = harness();
    let (status, body) =
        send(&h.app, get("/api/tenant/structured-data", Some("osdiving.com"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["@type"], "Organization");

    let (status, body) =
        send(&h.app, get("/api/tenant/contact-methods", Some("osdiving.com"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["type"], "phone");
}

#[tokio::test]
async fn test_no_tenant_is_not_found() {
    let h = harness();
    let (status, body) = send(&h.app, get("/api/tenant", Some("nobody.example"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "no_tenant");
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let h = harness();
    let (status, body) = send(&h.app, get("/clients/ghost/api/tenant", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "tenant_not_found");
}

#[tokio::test]
async fn test_invalid_document_reports_issues() {
    let h = harness();
    let mut doc = document_for("broken");
    doc["contact"]["email"] = json!("not-an-email");
    doc["branding"]["colors"]["primary"] = json!("blue");
    h.content.write_document("broken", &doc);

    let (status, body) = send(&h.app, get("/api/tenant", Some("broken.example"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "invalid_configuration");
    let paths: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"contact.email"));
    assert!(paths.contains(&"branding.colors.primary"));
}

#[tokio::test]
async fn test_request_id_is_set_and_propagated() {
    let h = harness();
    let response = h.app.clone().oneshot(get("/health", None)).await.unwrap();
    let generated = response.headers().get("x-request-id").unwrap();
    assert_eq!(generated.len(), 36);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_admin_requires_key() {
    let h = harness();
    let request = Request::builder()
        .uri("/admin/status")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&h.admin, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/admin/status")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&h.admin, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&h.admin, admin(Method::GET, "/admin/status", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached_tenants"], 0);
}

#[tokio::test]
async fn test_admin_preload_and_clear() {
    let h = harness();
    h.content.write_raw("broken", "{");

    let (status, body) = send(
        &h.admin,
        admin(
            Method::POST,
            "/admin/preload",
            Some(json!({ "slugs": [SAMPLE_SLUG, "broken"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], json!([SAMPLE_SLUG]));
    assert_eq!(body["failed"][0]["slug"], "broken");
    assert_eq!(body["failed"][0]["code"], "invalid_json");

    let (_, body) = send(&h.admin, admin(Method::GET, "/admin/cache", None)).await;
    assert_eq!(body["slugs"], json!([SAMPLE_SLUG]));

    let uri = format!("/admin/cache/{SAMPLE_SLUG}");
    let (status, body) = send(&h.admin, admin(Method::DELETE, &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 1);
    assert!(h.loader.cache().is_empty());

    let (_, body) = send(&h.admin, admin(Method::DELETE, "/admin/cache", None)).await;
    assert_eq!(body["cleared"], 0);
}

#[tokio::test]
async fn test_admin_validate() {
    let h = harness();
    let (status, body) = send(
        &h.admin,
        admin(Method::POST, "/admin/validate", Some(document_for("reef"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(
        &h.admin,
        admin(Method::POST, "/admin/validate", Some(json!({ "tenant": {} }))),
    )
    .await;
    assert_eq!(body["success"], false);
    assert!(!body["errors"].as_array().unwrap().is_empty());
}
