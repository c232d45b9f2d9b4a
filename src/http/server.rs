//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all tenant content handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Resolve the tenant for each request and load it through a TenantContext
//! - Bind server to listener and drain on shutdown

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{MatchedPath, OriginalUri, Path, State},
    http::{HeaderMap, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::content::loader::ConfigLoader;
use crate::content::model::ClientConfig;
use crate::content::utils::{available_contact_methods, organization_schema};
use crate::http::request::{propagate_request_id_layer, request_context, set_request_id_layer};
use crate::http::response::ApiError;
use crate::lifecycle::Shutdown;
use crate::observability::{metrics, tracing as request_tracing};
use crate::tenant::context::TenantContext;
use crate::tenant::resolver::{ResolutionStrategy, TenantResolver};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<ConfigLoader>,
    pub resolver: Arc<TenantResolver>,
    /// Primary strategy followed by fallbacks.
    pub strategies: Arc<[ResolutionStrategy]>,
    pub base_path: Arc<PathBuf>,
    pub use_cache: bool,
    pub admin_api_key: Arc<str>,
}

impl AppState {
    pub fn new(config: &ServiceConfig, loader: Arc<ConfigLoader>) -> Self {
        Self {
            loader,
            resolver: Arc::new(TenantResolver::from_config(&config.resolver)),
            strategies: config.resolver.strategy_chain().into(),
            base_path: Arc::new(config.content.base_path.clone()),
            use_cache: config.content.use_cache,
            admin_api_key: Arc::from(config.admin.api_key.as_str()),
        }
    }

    /// Resolve the tenant for a request and load it.
    pub async fn tenant_context(
        &self,
        headers: &HeaderMap,
        uri: &axum::http::Uri,
    ) -> Result<TenantContext, ApiError> {
        let ctx = request_context(headers, uri);
        let slug = self
            .resolver
            .resolve_with_fallbacks(&ctx, &self.strategies)
            .ok_or(ApiError::NoTenant)?;
        request_tracing::record_tenant(slug.as_str());

        let context = TenantContext::new(
            Arc::clone(&self.loader),
            Some(slug.into()),
            self.base_path.as_ref().clone(),
        )
        .use_cache(self.use_cache);
        context.reload().await;

        match context.error() {
            Some(e) => Err(ApiError::Tenant(e)),
            None => Ok(context),
        }
    }
}

/// HTTP server for tenant content.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given settings.
    pub fn new(config: &ServiceConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .merge(tenant_routes())
            .nest("/clients/{slug}", tenant_routes())
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request<Body>| request_tracing::request_span(req)),
            )
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Config sub-trees served by `/api/tenant/{section}`.
pub const SECTIONS: &[&str] = &[
    "company",
    "contact",
    "team",
    "branding",
    "social",
    "features",
    "courses",
    "diveSites",
    "gallery",
    "testimonials",
    "blog",
    "seo",
    "pricing",
];

fn tenant_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tenant", get(get_tenant))
        .route("/api/tenant/structured-data", get(get_structured_data))
        .route("/api/tenant/contact-methods", get(get_contact_methods))
        .route("/api/tenant/{section}", get(get_section))
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), &route, start);
    response
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn ready_config(
    state: &AppState,
    headers: &HeaderMap,
    uri: &axum::http::Uri,
) -> Result<Arc<ClientConfig>, ApiError> {
    let context = state.tenant_context(headers, uri).await?;
    context.config().ok_or(ApiError::NoTenant)
}

async fn get_tenant(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let config = ready_config(&state, &headers, &uri).await?;
    Ok(Json(config.as_ref()).into_response())
}

async fn get_section(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(params): Path<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let section = params.get("section").cloned().unwrap_or_default();
    if !SECTIONS.contains(&section.as_str()) {
        return Err(ApiError::UnknownSection(section));
    }
    let context = state.tenant_context(&headers, &uri).await?;

    let response = match section.as_str() {
        "company" => Json(context.company()).into_response(),
        "contact" => Json(context.contact()).into_response(),
        "team" => Json(context.team()).into_response(),
        "branding" => Json(context.branding()).into_response(),
        "social" => Json(context.social()).into_response(),
        "features" => Json(context.features()).into_response(),
        "courses" => Json(context.courses()).into_response(),
        "diveSites" => Json(context.dive_sites()).into_response(),
        "gallery" => Json(context.gallery()).into_response(),
        "testimonials" => Json(context.testimonials()).into_response(),
        "blog" => Json(context.blog()).into_response(),
        "seo" => Json(context.seo()).into_response(),
        "pricing" => Json(context.pricing()).into_response(),
        _ => return Err(ApiError::UnknownSection(section)),
    };
    Ok(response)
}

async fn get_structured_data(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let config = ready_config(&state, &headers, &uri).await?;
    Ok(Json(organization_schema(&config)))
}

async fn get_contact_methods(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let config = ready_config(&state, &headers, &uri).await?;
    Ok(Json(available_contact_methods(&config)).into_response())
}
