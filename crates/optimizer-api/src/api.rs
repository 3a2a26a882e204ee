//! HTTP API: optimizer endpoints, health probes and Prometheus metrics

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use optimizer_lib::{
    health::{ComponentStatus, HealthRegistry},
    knowledge::KnowledgeUpsertJob,
    model_status::ModelStatusReport,
    observability::{OptimizerMetrics, StructuredLogger},
    predictor::{simulate_plant_summary, PlantSummary, Synthesizer},
    warehouse::WarehouseHandle,
    ChatReply, ChatRequest, ChatService, ComprehensivePrediction, ModelFamily, PlantMetrics,
    UpsertResult,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub const SERVICE_NAME: &str = "CementAI Optimizer API";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: OptimizerMetrics,
    pub logger: StructuredLogger,
    pub synthesizer: Synthesizer,
    pub warehouse: WarehouseHandle,
    pub knowledge_job: KnowledgeUpsertJob,
    pub chat: ChatService,
}

/// Error body `{detail}` with a status code
#[derive(Debug)]
pub enum ApiError {
    InvalidBody(String),
    Prediction(String),
    Internal(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidBody(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail),
            ApiError::Prediction(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Prediction failed: {}", message),
            ),
            ApiError::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
    pub version: String,
    pub models_ready: bool,
    pub models_count: usize,
    pub models: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlantStatus {
    pub status: String,
    pub data: Vec<serde_json::Value>,
    pub summary: PlantSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LegacyHealth {
    pub status: String,
    pub timestamp: String,
    pub bigquery_connected: bool,
    pub models_count: usize,
}

/// Optional body of a knowledge refresh
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub table: Option<String>,
}

fn model_names() -> Vec<String> {
    ModelFamily::model_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

async fn root(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "operational".to_string(),
        service: SERVICE_NAME.to_string(),
        version: SERVICE_VERSION.to_string(),
        models_ready: state.warehouse.is_connected(),
        models_count: ModelFamily::ALL.len(),
        models: model_names(),
    })
}

/// Current plant status and 24-hour trends
async fn plant_status() -> Json<PlantStatus> {
    let summary = simulate_plant_summary(&mut rand::thread_rng());
    Json(PlantStatus {
        status: "ok".to_string(),
        data: Vec::new(),
        summary,
    })
}

/// Run all eight models against the posted metrics
async fn predict_comprehensive(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlantMetrics>, JsonRejection>,
) -> Result<Json<ComprehensivePrediction>, ApiError> {
    let Json(metrics) = payload?;
    let started = Instant::now();

    match state.synthesizer.synthesize(metrics).await {
        Ok(prediction) => {
            let elapsed = started.elapsed();
            state.metrics.observe_synthesis_latency(elapsed.as_secs_f64());
            for recommendation in &prediction.recommendations {
                state.metrics.inc_recommendation(recommendation.priority);
            }
            state.logger.log_prediction(
                prediction.recommendations.len(),
                prediction.total_savings_per_day,
                elapsed.as_millis(),
            );
            Ok(Json(prediction))
        }
        Err(e) => {
            state.metrics.inc_synthesis_failures();
            error!(error = %e, "Comprehensive prediction failed");
            Err(ApiError::Prediction(e.to_string()))
        }
    }
}

async fn models_status(State(state): State<Arc<AppState>>) -> Json<ModelStatusReport> {
    Json(ModelStatusReport::check(&state.warehouse).await)
}

/// Legacy health check kept for existing dashboards
async fn legacy_health(State(state): State<Arc<AppState>>) -> Json<LegacyHealth> {
    Json(LegacyHealth {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        bigquery_connected: state.warehouse.is_connected(),
        models_count: ModelFamily::ALL.len(),
    })
}

/// Health check response - returns 200 if operational, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(format!("failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.chat.respond(&request).await))
}

/// Merge the knowledge catalog into the warehouse.
/// The body is optional; `{"table": "..."}` overrides the target table.
async fn refresh_knowledge(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<UpsertResult>), ApiError> {
    let request: RefreshRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidBody(e.to_string()))?
    };

    let result = match request.table {
        Some(table) => state.knowledge_job.with_table(table).run().await,
        None => state.knowledge_job.run().await,
    };

    let status = if result.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(result)))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/plant-status", get(plant_status))
        .route("/api/predict-comprehensive", post(predict_comprehensive))
        .route("/api/models/status", get(models_status))
        .route("/api/chat", post(chat))
        .route("/api/knowledge/refresh", post(refresh_knowledge))
        .route("/health", get(legacy_health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .layer(cors)
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
