/// HTTP front end: `POST /position` takes a batch of reports and relays each one.
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    config::RelayConfig,
    model::PositionBatch,
    relay::{BatchOutcome, Relay},
    transport::CotSink,
};

/// Shared by all requests; read-only after startup.
#[derive(Clone)]
pub struct AppState {
    relay: Arc<Relay<Arc<dyn CotSink>>>,
    config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(sink: Arc<dyn CotSink>, config: RelayConfig) -> Self {
        Self {
            relay: Arc::new(Relay::new(sink)),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Debug)]
pub enum ApiError {
    Forbidden,
    Invalid(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Invalid API key".to_string()),
            ApiError::Invalid(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/position", post(post_position))
        .with_state(state)
}

/// POST /position
///
/// The batch is relayed on the blocking pool since sinks use synchronous sockets.
async fn post_position(
    State(state): State<AppState>,
    Json(batch): Json<PositionBatch>,
) -> Result<Json<PositionResponse>, ApiError> {
    if !state.config.is_authorized(&batch.api_key) {
        warn!("rejected batch of {} with unknown api key", batch.objects.len());
        return Err(ApiError::Forbidden);
    }
    batch.validate().map_err(|e| ApiError::Invalid(e.to_string()))?;

    info!("relaying batch of {}", batch.objects.len());
    let now = Utc::now();
    let relay = state.relay.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        relay.relay_batch(&batch.objects, batch.stale_minutes(), now)
    })
    .await
    .map_err(|e| {
        error!("relay task failed: {e}");
        ApiError::Internal("relay task failed".to_string())
    })?;
    let status = if outcome.is_complete() {
        "sent"
    } else {
        "partial"
    };
    Ok(Json(PositionResponse { status, outcome }))
}
