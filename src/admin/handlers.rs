use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::content::validator::{safe_validate, ValidationReport};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub cached_tenants: usize,
}

#[derive(Serialize)]
pub struct CacheSummary {
    pub count: usize,
    pub slugs: Vec<String>,
}

#[derive(Serialize)]
pub struct ClearedCache {
    pub cleared: usize,
}

#[derive(Deserialize)]
pub struct PreloadRequest {
    pub slugs: Vec<String>,
}

#[derive(Serialize)]
pub struct PreloadFailureSummary {
    pub slug: String,
    pub code: &'static str,
    pub error: String,
}

#[derive(Serialize)]
pub struct PreloadSummary {
    pub loaded: Vec<String>,
    pub failed: Vec<PreloadFailureSummary>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        cached_tenants: state.loader.cache().len(),
    })
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheSummary> {
    let slugs = state.loader.cache().slugs();
    Json(CacheSummary {
        count: slugs.len(),
        slugs,
    })
}

pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearedCache> {
    let cleared = state.loader.clear_cache(None);
    Json(ClearedCache { cleared })
}

pub async fn clear_tenant(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Json<ClearedCache> {
    let cleared = state.loader.clear_cache(Some(&slug));
    Json(ClearedCache { cleared })
}

pub async fn preload(
    State(state): State<AppState>,
    Json(request): Json<PreloadRequest>,
) -> Json<PreloadSummary> {
    let report = state.loader.preload(&request.slugs, &state.base_path).await;
    Json(PreloadSummary {
        loaded: report.loaded_slugs().into_iter().map(str::to_string).collect(),
        failed: report
            .failed
            .iter()
            .map(|f| PreloadFailureSummary {
                slug: f.slug.clone(),
                code: f.error.code(),
                error: f.error.to_string(),
            })
            .collect(),
    })
}

/// Validate a document without storing it.
pub async fn validate_document(Json(document): Json<serde_json::Value>) -> Json<ValidationReport> {
    Json(safe_validate(&document))
}
