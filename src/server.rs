//! HTTP boundary for the ingestion pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/ingest_pdf` | Ingest `{"openai_file_ids": [...]}` synchronously |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Response Contract
//!
//! Success is `202 Accepted` with `{"job_id": "...", "message": "Ingestion complete"}`.
//! The work has already finished when the response is sent.
//!
//! Errors are `{"error": "..."}`:
//!
//! | Status | Cause |
//! |--------|-------|
//! | 400 | missing or empty `openai_file_ids`, blank id, malformed JSON |
//! | 500 | fetch, extraction, embedding, or store failure |
//! | 504 | the pipeline deadline expired |

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::IngestError;
use crate::pipeline::Pipeline;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

/// Builds the router around an already-constructed pipeline.
pub fn build_router(pipeline: Arc<Pipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/ingest_pdf", post(handle_ingest))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

/// Starts the server on `[server].bind` and runs until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = Arc::new(Pipeline::from_config(config)?);
    let app = build_router(pipeline);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "ingestion server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

// ============ Request / response bodies ============

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub openai_file_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Parses the request body. An empty body counts as `{}`.
pub fn parse_request(body: &[u8]) -> Result<Vec<String>, IngestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let request: IngestRequest = serde_json::from_slice(body)
        .map_err(|e| IngestError::RequestValidation(format!("invalid JSON body: {}", e)))?;
    Ok(request.openai_file_ids.unwrap_or_default())
}

// ============ Error response ============

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::RequestValidation(message) => AppError {
                status: StatusCode::BAD_REQUEST,
                message,
            },
            IngestError::Timeout(_) => AppError {
                status: StatusCode::GATEWAY_TIMEOUT,
                message: err.to_string(),
            },
            other => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("ingestion failed: {}", other),
            },
        }
    }
}

// ============ POST /api/ingest_pdf ============

async fn handle_ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    let references = parse_request(&body)?;
    let report = state.pipeline.ingest(&references).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            job_id: report.job_id.clone(),
            message: report.message().to_string(),
        }),
    ))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
