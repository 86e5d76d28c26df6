//! REST API Server for the document analyzer
//!
//! Exposes normalization and the analysis crew over HTTP

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::crew::Crew;
use crate::error::AnalyzerError;
use crate::normalize::normalize;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyzeRequest {
    pub file_path: Option<String>,
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub pages: Vec<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> serde_json::Result<Self> {
        Ok(Self {
            success: true,
            data: Some(serde_json::to_value(data)?),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub crew: Arc<Crew>,
}

/// 200 with the payload, or 500 if it cannot be serialized
fn ok_response<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse>) {
    match ApiResponse::success(data) {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            warn!(error = %e, "Failed to serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Failed to serialize response: {}", e))),
            )
        }
    }
}

fn bad_request(rejection: JsonRejection) -> (StatusCode, Json<ApiResponse>) {
    warn!(error = %rejection.body_text(), "Rejected request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(format!("Invalid request: {}", rejection.body_text()))),
    )
}

/// Status code for a failed analysis
fn status_for(error: &AnalyzerError) -> StatusCode {
    match error {
        AnalyzerError::DocumentUnreadable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AnalyzerError::DocumentTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AnalyzerError::InvalidToolInput(_) => StatusCode::BAD_REQUEST,
        AnalyzerError::LlmError(_) | AnalyzerError::HttpError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Normalization Endpoint
/// =============================

async fn normalize_pages(
    payload: Result<Json<NormalizeRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection),
    };

    let text = normalize(&req.pages);

    ok_response(serde_json::json!({
        "text": text,
        "pages": req.pages.len(),
    }))
}

/// =============================
/// Analysis Endpoint
/// =============================

async fn run_analysis(
    State(state): State<ApiState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection),
    };

    let file_path = req
        .file_path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    info!(
        file_path = ?file_path,
        query = ?req.query,
        "Received analysis request"
    );

    match state.crew.kickoff_with(file_path, req.query).await {
        Ok(report) => ok_response(report),
        Err(e) => {
            let status = status_for(&e);
            warn!(%status, error = %e, "Analysis failed");
            (status, Json(ApiResponse::error(format!("Analysis failed: {}", e))))
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(crew: Arc<Crew>) -> Router {
    let state = ApiState { crew };

    Router::new()
        .route("/health", get(health))
        .route("/api/normalize", post(normalize_pages))
        .route("/api/analyze", post(run_analysis))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    crew: Arc<Crew>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(crew);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
