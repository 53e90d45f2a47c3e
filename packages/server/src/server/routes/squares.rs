//! Public read path for grid renderers.
//!
//! GET /squares/pages/:page → squares currently on display

use axum::{
    extract::{Extension, Path},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domains::squares::lifecycle::is_active;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayedSquare {
    pub square_number: u32,
    pub business_name: String,
    pub deal_link: Option<String>,
    pub logo_reference: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub page: u32,
    pub first_square: u32,
    pub last_square: u32,
    pub squares: Vec<DisplayedSquare>,
}

/// Active squares on one page. Pending and expired records are not shown.
pub async fn page_handler(
    Extension(state): Extension<AppState>,
    Path(page): Path<u32>,
) -> Result<Json<PageResponse>, ApiError> {
    let range = state
        .layout
        .page_range(page)
        .ok_or_else(|| ApiError::NotFound(format!("Page {} does not exist", page)))?;

    let now = Utc::now();
    let squares = state
        .store
        .list_squares(range.clone())
        .await?
        .into_iter()
        .filter(|r| is_active(r, now))
        .map(|r| DisplayedSquare {
            square_number: r.square_number,
            business_name: r.payload.business_name,
            deal_link: r.payload.deal_link,
            logo_reference: r.payload.logo_reference,
            expires_at: r.expires_at,
        })
        .collect();

    Ok(Json(PageResponse {
        page,
        first_square: *range.start(),
        last_square: *range.end(),
        squares,
    }))
}
