use axum::{extract::State, http::StatusCode};
use log::error;

use super::state::AppState;

/// GET /health
/// Reports whether the schedule store answers a trivial query
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let database = state.database.clone();
    let probe = tokio::task::spawn_blocking(move || database.ping()).await;

    match probe {
        Ok(Ok(())) => (StatusCode::OK, "ok"),
        Ok(Err(e)) => {
            error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
        Err(e) => {
            error!("Health check task failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
