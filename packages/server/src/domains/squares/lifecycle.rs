//! Read-time lifecycle classification.
//!
//! Pure function of a record and an instant. Nothing here deletes or mutates
//! records; the UI read path and rotation candidate selection both call it.

use chrono::{DateTime, Utc};

use super::models::square::{PaymentStatus, SquareRecord, SquareStatus};

pub fn status(record: &SquareRecord, now: DateTime<Utc>) -> SquareStatus {
    if record.retired_at.is_some() || now >= record.expires_at {
        return SquareStatus::Expired;
    }

    match record.payment_status {
        PaymentStatus::Pending => SquareStatus::Pending,
        // Confirmed but the purchase window has not opened yet
        PaymentStatus::Confirmed if now < record.purchased_at => SquareStatus::Pending,
        PaymentStatus::Confirmed => SquareStatus::Active,
    }
}

pub fn is_active(record: &SquareRecord, now: DateTime<Utc>) -> bool {
    status(record, now) == SquareStatus::Active
}
