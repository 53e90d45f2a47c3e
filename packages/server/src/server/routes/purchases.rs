//! Purchase endpoints called by the payment glue.
//!
//! POST /purchases              → reserve a square (pending payment)
//! POST /purchases/:id/confirm  → payment captured
//! POST /purchases/:id/cancel   → payment failed, release the square

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domains::squares::actions::{cancel_purchase, confirm_purchase, reserve_square};
use crate::domains::squares::{AdPayload, SquareRecord};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseRequest {
    pub square_number: u32,
    #[serde(flatten)]
    pub payload: AdPayload,
    pub duration_days: i64,
    /// Defaults to now
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
}

pub async fn create_purchase_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<SquareRecord>), ApiError> {
    let duration = Duration::try_days(request.duration_days)
        .ok_or_else(|| ApiError::BadRequest("durationDays is out of range".to_string()))?;

    let record = reserve_square(
        state.store.as_ref(),
        &state.layout,
        request.square_number,
        request.payload,
        request.purchased_at.unwrap_or_else(Utc::now),
        duration,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn confirm_purchase_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SquareRecord>, ApiError> {
    Ok(Json(confirm_purchase(state.store.as_ref(), id).await?))
}

pub async fn cancel_purchase_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    cancel_purchase(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
