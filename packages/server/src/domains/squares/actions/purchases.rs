//! Purchase registration.
//!
//! A purchase starts life as a pending record holding its square. The payment
//! provider's outcome either confirms it (the record becomes eligible for
//! display and rotation) or cancels it (the square is released).

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::common::GridLayout;
use crate::domains::squares::errors::PurchaseError;
use crate::domains::squares::models::square::{AdPayload, SquareRecord};
use crate::domains::squares::store::SquareStore;

/// Reserve `square` for `duration`, starting at `purchased_at`.
pub async fn reserve_square(
    store: &dyn SquareStore,
    layout: &GridLayout,
    square: u32,
    payload: AdPayload,
    purchased_at: DateTime<Utc>,
    duration: Duration,
) -> Result<SquareRecord, PurchaseError> {
    if !layout.contains(square) {
        return Err(PurchaseError::InvalidSquare(square));
    }
    if duration <= Duration::zero() {
        return Err(PurchaseError::InvalidDuration);
    }
    let now = Utc::now();
    let expires_at = purchased_at + duration;
    if expires_at <= now {
        return Err(PurchaseError::AlreadyExpired(expires_at));
    }

    let record = SquareRecord::builder()
        .square_number(square)
        .page_number(layout.page_of(square))
        .payload(payload)
        .purchased_at(purchased_at)
        .expires_at(expires_at)
        .build();

    let record = store.insert_pending(record, now).await?;
    info!(
        record_id = %record.id,
        square = record.square_number,
        page = record.page_number,
        "square reserved pending payment"
    );
    Ok(record)
}

/// Payment succeeded: the record becomes active.
pub async fn confirm_purchase(
    store: &dyn SquareStore,
    id: Uuid,
) -> Result<SquareRecord, PurchaseError> {
    let record = store.confirm_payment(id).await?;
    info!(record_id = %id, square = record.square_number, "purchase confirmed");
    Ok(record)
}

/// Payment failed: release the square.
pub async fn cancel_purchase(store: &dyn SquareStore, id: Uuid) -> Result<(), PurchaseError> {
    store.cancel_pending(id).await?;
    info!(record_id = %id, "pending purchase cancelled");
    Ok(())
}
