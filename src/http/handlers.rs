//! Request handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use crate::compiler::{compile as compile_distribution, CompiledDistribution};
use crate::deploy::{ApiKey, DeployReport, Deployer, FastlyApi, API_KEY_HEADER};
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::snippet::RenderedSnippet;
use crate::source::DistributionConfig;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CompileResponse {
    pub service_id: String,
    pub snippets: Vec<RenderedSnippet>,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

fn credential(headers: &HeaderMap) -> Result<ApiKey, AppError> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ApiKey::new)
        .ok_or(AppError::MissingCredential)
}

fn compile_body(
    state: &AppState,
    service_id: &str,
    body: &[u8],
) -> Result<CompiledDistribution, AppError> {
    let document: DistributionConfig =
        serde_json::from_slice(body).map_err(AppError::InvalidDocument)?;
    Ok(compile_distribution(&document, service_id, &state.compile_options)?)
}

/// Compile and return the snippets without touching the platform.
pub async fn compile(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    body: Bytes,
) -> Result<Json<CompileResponse>, AppError> {
    let compiled = compile_body(&state, &service_id, &body)?;
    Ok(Json(CompileResponse {
        service_id,
        snippets: compiled.snippets.rendered(),
    }))
}

/// Compile and deploy to a fresh draft version, then activate it.
pub async fn deploy(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DeployReport>, AppError> {
    let key = credential(&headers)?;
    let compiled = compile_body(&state, &service_id, &body)?;

    let api = FastlyApi::new(state.client.clone(), state.api_base_url.clone(), key);
    let report = Deployer::new(api).deploy(&service_id, &compiled.snippets).await?;

    Ok(Json(report))
}
