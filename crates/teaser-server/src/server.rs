//! The HTTP surface: analyze, render, and the rendered-file routes.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use teaser_core::TeaserConfig;
use teaser_render::RenderPipeline;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::analyzer::{AnalyzeError, ContentAnalyzer, FirecrawlAnalyzer};
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RenderPipeline>,
    pub analyzer: Arc<dyn ContentAnalyzer>,
    pub output_dir: PathBuf,
}

impl AppState {
    pub fn from_config(config: &TeaserConfig) -> Result<Self> {
        let pipeline = RenderPipeline::from_config(config).context("failed to set up render pipeline")?;
        Ok(Self {
            pipeline: Arc::new(pipeline),
            analyzer: Arc::new(FirecrawlAnalyzer::new(&config.analyzer)),
            output_dir: config.render.output_dir.clone(),
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(origins)
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let output_dir = state.output_dir.clone();
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/render", post(render))
        .nest_service("/output", ServeDir::new(&output_dir))
        .nest_service("/api/output", ServeDir::new(&output_dir))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

pub async fn serve(config: TeaserConfig) -> Result<()> {
    std::fs::create_dir_all(&config.render.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.render.output_dir.display()
        )
    })?;
    let state = AppState::from_config(&config)?;
    let app = router(state, &config.server.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Parse a JSON object body. An empty body counts as `{}`.
fn parse_object(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err(ApiError::bad_request("request body must be a JSON object")),
        Err(e) => Err(ApiError::bad_request(format!("invalid JSON body: {}", e))),
    }
}

async fn analyze(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let body = parse_object(&body)?;
    let url = body
        .get("url")
        .and_then(Value::as_str)
        .ok_or(AnalyzeError::InvalidUrl)?;
    let summary = state.analyzer.analyze(url).await?;
    Ok(Json(summary))
}

async fn render(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let body = parse_object(&body)?;
    let output = state.pipeline.render_json(&body).await?;
    Ok(Json(json!({ "videoUrl": output.video_url })))
}
