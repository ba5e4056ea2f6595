use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::{DailyRollup, SnapshotStore};

use super::handlers::{
    daily_handler, health_handler, save_snapshot_handler, snapshots_handler, AppState,
};

pub fn create_router(store: SnapshotStore) -> Router {
    let state = AppState {
        rollup: DailyRollup::new(store.clone()),
        store,
    };

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/snapshots", post(save_snapshot_handler).get(snapshots_handler))
        .route("/api/snapshots/daily", get(daily_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
