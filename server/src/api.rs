//! HTTP API behind the churn dashboard.
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness and whether predictions can be served
//! - `GET /api/model` - Loaded artifact, schema width and audit
//! - `POST /api/form/resolve` - Apply the phone/internet gates to a form
//! - `POST /api/predict` - Score one customer

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use churn_core::{
    AttributeRecord, ChurnError, ChurnPredictor, FormSelections, Gates, PredictionResult,
    SchemaAudit, Summary,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

/// Shared, read-only state. The predictor is loaded once before the
/// listener starts.
#[derive(Clone)]
pub struct AppState {
    predictor: Arc<ChurnPredictor>,
}

impl AppState {
    pub fn new(predictor: ChurnPredictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/model", get(model_info))
        .route("/api/form/resolve", post(resolve_form))
        .route("/api/predict", post(predict))
        .with_state(state)
}

/// Failure of a scoring request.
pub struct ApiError(ChurnError);

impl From<ChurnError> for ApiError {
    fn from(err: ChurnError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ChurnError::SchemaMismatch(_) => StatusCode::SERVICE_UNAVAILABLE,
            ChurnError::ModelUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!(error = %self.0, "prediction refused");
        let body = Json(json!({
            "error": "prediction unavailable",
            "detail": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    prediction_available: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        prediction_available: state.predictor.schema().is_ok(),
    })
}

#[derive(Serialize)]
struct ModelInfo<'a> {
    path: String,
    kind: churn_core::ModelKind,
    fingerprint: &'a str,
    threshold: f64,
    features: Option<usize>,
    audit: Option<&'a SchemaAudit>,
}

async fn model_info(State(state): State<AppState>) -> Response {
    let predictor = &state.predictor;
    let model = predictor.model();
    Json(ModelInfo {
        path: model.path().display().to_string(),
        kind: model.kind(),
        fingerprint: model.fingerprint(),
        threshold: model.threshold(),
        features: predictor.schema().ok().map(|s| s.len()),
        audit: predictor.audit(),
    })
    .into_response()
}

#[derive(Serialize)]
struct ResolveResponse {
    gates: Gates,
    record: AttributeRecord,
}

async fn resolve_form(Json(form): Json<FormSelections>) -> Json<ResolveResponse> {
    Json(ResolveResponse {
        gates: form.gates(),
        record: form.resolve(),
    })
}

#[derive(Serialize)]
struct PredictResponse {
    record: AttributeRecord,
    prediction: PredictionResult,
    churn_percent: f64,
    summary: Summary,
    dropped_features: Vec<String>,
    warnings: Vec<String>,
}

// Malformed or out-of-range input never reaches this handler: the Json
// extractor rejects it with 422.
async fn predict(
    State(state): State<AppState>,
    Json(form): Json<FormSelections>,
) -> Result<Json<PredictResponse>, ApiError> {
    let record = form.resolve();
    let report = state.predictor.predict(&record)?;
    let summary = Summary::new(&report.result, &record);

    info!(
        label = %report.result.label,
        percent = report.result.churn_percent(),
        risk = ?summary.risk_band,
        "customer scored"
    );

    Ok(Json(PredictResponse {
        churn_percent: report.result.churn_percent(),
        prediction: report.result,
        summary,
        record,
        dropped_features: report.dropped_features,
        warnings: report.warnings,
    }))
}
