use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::engine;
use crate::error::RiskError;
use crate::histogram::Histogram;
use crate::simulation::CancelToken;
use crate::types::{RiskInput, RiskSummary};

/// Shared server settings
#[derive(Debug, Clone)]
pub struct ApiState {
    pub config: SimulationConfig,
    /// Upper bound on a single simulation request
    pub timeout: Duration,
    /// Largest accepted `n_sim * n_trades` per request
    pub max_work: u64,
}

/// Default ceiling on simulated trades per request
pub const DEFAULT_MAX_WORK: u64 = 200_000_000;

impl Default for ApiState {
    fn default() -> Self {
        Self {
            config: SimulationConfig::default(),
            timeout: Duration::from_secs(30),
            max_work: DEFAULT_MAX_WORK,
        }
    }
}

/// Body for POST /api/simulate
#[derive(Debug, Clone, Deserialize)]
pub struct SimulateRequest {
    #[serde(flatten)]
    pub input: RiskInput,
    /// Overrides the server's configured seed
    pub seed: Option<u64>,
}

/// Response for POST /api/simulate
#[derive(Debug, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub run_id: Uuid,
    pub seed: u64,
    pub summary: RiskSummary,
    pub max_dds: Vec<f64>,
    pub histogram: Histogram,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/simulate", post(post_simulate))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .with_state(state)
}

/// GET /api/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// POST /api/simulate - validate, simulate and size risk
pub async fn post_simulate(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<SimulateRequest>,
) -> Response {
    let params = match engine::validate(&req.input) {
        Ok(params) => params,
        Err(e) => return error_response(&e).into_response(),
    };

    let work = (params.n_sim() as u64).saturating_mul(params.n_trades() as u64);
    if work > state.max_work {
        let err = RiskError::invalid(
            "n_sim",
            format!(
                "n_sim * n_trades = {} exceeds the server limit of {}",
                work, state.max_work
            ),
        );
        return error_response(&err).into_response();
    }

    let config = SimulationConfig {
        seed: req.seed.or(state.config.seed),
        ..state.config.clone()
    };

    let token = CancelToken::new();
    let worker_token = token.clone();
    let handle = tokio::task::spawn_blocking(move || {
        engine::simulate_with_progress(&params, &config, worker_token.as_progress_check())
    });

    let report = match tokio::time::timeout(state.timeout, handle).await {
        Ok(Ok(Ok(report))) => report,
        Ok(Ok(Err(e))) => return error_response(&e).into_response(),
        Ok(Err(e)) => {
            error!("Simulation task failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "simulation task failed"})),
            )
                .into_response();
        }
        Err(_) => {
            token.cancel();
            warn!("Simulation exceeded {:?}, cancelling", state.timeout);
            return (
                StatusCode::GATEWAY_TIMEOUT,
                Json(serde_json::json!({"error": "simulation timed out"})),
            )
                .into_response();
        }
    };

    info!("Served run {} ({} trials)", report.run_id, report.batch.len());

    Json(SimulateResponse {
        run_id: report.run_id,
        seed: report.seed,
        summary: report.summary,
        max_dds: report.batch.max_dds().to_vec(),
        histogram: report.histogram,
    })
    .into_response()
}

fn error_response(err: &RiskError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        RiskError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        RiskError::DegenerateRisk { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RiskError::RandomnessUnavailable(_) | RiskError::Cancelled { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let body = match err {
        RiskError::DegenerateRisk {
            max_dd_max,
            risk_suggestion_worst_pct,
            ..
        } => serde_json::json!({
            "error": err.to_string(),
            "max_dd_max": max_dd_max,
            "risk_suggestion_worst_pct": risk_suggestion_worst_pct,
        }),
        _ => serde_json::json!({"error": err.to_string()}),
    };
    (status, Json(body))
}
