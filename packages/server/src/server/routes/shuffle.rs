//! Administrator rotation surface.
//!
//! GET  /shuffle/stats  → rotation counters
//! POST /shuffle        → rotate now

use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::domains::rotation::{PageFailure, RotationStats};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleResponse {
    /// Records whose square number actually changed.
    pub shuffled_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_pages: Vec<PageFailure>,
}

pub async fn shuffle_stats_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<RotationStats>, ApiError> {
    Ok(Json(state.stats.report().await?))
}

/// Trigger an immediate rotation. Queues behind a rotation already in flight.
pub async fn shuffle_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<ShuffleResponse>, ApiError> {
    let result = state.scheduler.trigger_manual().await?;
    Ok(Json(ShuffleResponse {
        shuffled_count: result.moved_count,
        failed_pages: result.failed_pages,
    }))
}
