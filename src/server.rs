//! HTTP surface of the calculator.
//!
//! - `POST /calculate`: `IntegrationRequest` JSON in, `IntegrationResult` JSON out. Pipeline
//!   failures are answered with status 200 and `success: false`; a malformed body is
//!   rejected by the JSON extractor.
//! - `GET /`: the embedded page.
//! - `GET /health`: `{"status": "ok", "version": ...}`.
//!
//! The calculation is CPU-bound, so it runs on the blocking pool under a timeout.
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info, warn};
use serde_json::{Value, json};

use crate::Utils::config::AppConfig;
use crate::integrator::engine::{EngineSettings, IntegrationEngine};
use crate::integrator::request::{IntegrationRequest, IntegrationResult};

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<IntegrationEngine>,
    pub timeout: Duration,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        AppState {
            engine: Arc::new(IntegrationEngine::new(EngineSettings::from(config))),
            timeout: Duration::from_millis(config.server.request_timeout_ms),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/calculate", post(calculate))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

async fn calculate(
    State(state): State<AppState>,
    Json(request): Json<IntegrationRequest>,
) -> Json<IntegrationResult> {
    let engine = Arc::clone(&state.engine);
    let function = request.function.clone();
    // the worker stops at the same deadline the response is bounded by
    let deadline = Instant::now() + state.timeout;
    let result = run_bounded(state.timeout, &function, move || {
        engine.run_until(&request, Some(deadline))
    })
    .await;
    Json(result)
}

/// Runs `job` on the blocking pool. On timeout the response does not wait for the worker;
/// `calculate` hands the worker the same deadline so it stops on its own.
async fn run_bounded<F>(timeout: Duration, label: &str, job: F) -> IntegrationResult
where
    F: FnOnce() -> IntegrationResult + Send + 'static,
{
    let task = tokio::task::spawn_blocking(job);
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            error!("calculation of '{}' failed: {}", label, join_error);
            IntegrationResult::internal("the calculation was aborted")
        }
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            warn!("calculation of '{}' timed out after {} ms", label, timeout_ms);
            IntegrationResult::timeout(timeout_ms)
        }
    }
}

/// Binds the configured address and serves until the process is stopped.
pub async fn serve(config: Arc<AppConfig>) -> std::io::Result<()> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(AppState::from_config(&config))).await
}
