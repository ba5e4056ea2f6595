use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::application::{DailyRollup, SnapshotStore};
use crate::domain::HostSnapshot;
use crate::error::{StoreError, StoreResult};

/// Longest span the daily endpoint answers; each day becomes one bucket in memory
pub const MAX_ROLLUP_DAYS: i64 = 3660;

/// Error type that implements IntoResponse
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl AppError {
    fn bad_request(message: String) -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = if err.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Snapshot store error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        AppError {
            status,
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("Store task failed: {}", err);
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
    pub rollup: DailyRollup,
}

/// Query params for the range endpoints
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Response for /api/snapshots and /api/snapshots/daily
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotsResponse {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub snapshots: Vec<HostSnapshot>,
}

/// Run a store call off the async runtime
async fn blocking<T, F>(call: F) -> Result<T, AppError>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(call).await??)
}

/// Handler for GET /api/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "hostwatch"
        })),
    )
}

/// Handler for POST /api/snapshots
pub async fn save_snapshot_handler(
    State(state): State<AppState>,
    Json(snapshot): Json<HostSnapshot>,
) -> Result<StatusCode, AppError> {
    let timestamp = snapshot.timestamp;
    let store = state.store.clone();
    blocking(move || store.save(snapshot)).await?;

    info!("Recorded host snapshot taken at {}", timestamp);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/snapshots
pub async fn snapshots_handler(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<SnapshotsResponse>, AppError> {
    let RangeQuery { start, end } = range;
    let store = state.store.clone();
    let snapshots = blocking(move || store.get_range(start, end)).await?;

    Ok(Json(SnapshotsResponse {
        start,
        end,
        snapshots,
    }))
}

/// Handler for GET /api/snapshots/daily
pub async fn daily_handler(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<SnapshotsResponse>, AppError> {
    let RangeQuery { start, end } = range;
    if end - start > TimeDelta::days(MAX_ROLLUP_DAYS) {
        return Err(AppError::bad_request(format!(
            "daily rollup spans at most {MAX_ROLLUP_DAYS} days, got {start} to {end}"
        )));
    }

    let rollup = state.rollup.clone();
    let snapshots = blocking(move || rollup.daily(start, end)).await?;

    Ok(Json(SnapshotsResponse {
        start,
        end,
        snapshots,
    }))
}
