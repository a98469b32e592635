use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::PredictError;
use crate::predict::RewardPredictor;
use crate::types::{PredictionRequest, PredictionResult};

pub const WELCOME: &str = "Welcome to the reward points prediction API";

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    predictor: Arc<RewardPredictor>,
    log_predictions: bool,
}

impl AppState {
    pub fn new(predictor: Arc<RewardPredictor>) -> Self {
        Self {
            predictor,
            log_predictions: false,
        }
    }

    /// Per-request info line with the payload and raw/normalized scores.
    pub fn with_prediction_logging(mut self, on: bool) -> Self {
        self.log_predictions = on;
        self
    }
}

// ---------- Errors ----------

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, detail: S) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        let status = match e {
            PredictError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PredictError::PredictionFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorBody {
            detail: self.detail,
        });
        (self.status, payload).into_response()
    }
}

// ---------- Handlers ----------

async fn root() -> Json<Value> {
    Json(json!({ "message": WELCOME }))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(request) = payload?;

    let predictor = state.predictor.clone();
    let (request, scored) = tokio::task::spawn_blocking(move || {
        let scored = predictor.score(&request);
        (request, scored)
    })
    .await
    .map_err(|e| {
        tracing::error!("prediction task failed: {e}");
        ApiError::from(PredictError::PredictionFailure(
            "inference task aborted".to_string(),
        ))
    })?;

    match scored {
        Ok(scored) => {
            if state.log_predictions {
                tracing::info!(
                    "predict part_name={} eco_friendly={} material={} item_price={} raw={:.4} reward_points={:.4}",
                    request.part_name,
                    request.eco_friendly,
                    request.material,
                    request.item_price,
                    scored.raw,
                    scored.result.reward_points
                );
            }
            Ok(Json(scored.result))
        }
        Err(e) => {
            match &e {
                PredictError::InvalidInput(msg) => tracing::debug!("rejected request: {msg}"),
                PredictError::PredictionFailure(msg) => tracing::warn!("prediction failed: {msg}"),
            }
            Err(e.into())
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
