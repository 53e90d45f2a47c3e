//! Test fixtures for creating square records.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use grid_core::common::GridLayout;
use grid_core::domains::squares::{AdPayload, MemorySquareStore, PaymentStatus, SquareRecord};

pub fn payload(name: &str) -> AdPayload {
    AdPayload {
        business_name: name.to_string(),
        contact_email: format!("{}@example.test", name.to_lowercase().replace(' ', "-")),
        deal_link: Some(format!("https://example.test/{}", name.len())),
        logo_reference: None,
    }
}

/// Confirmed purchase, live from a day ago until thirty days out.
pub fn active_record(square: u32, now: DateTime<Utc>) -> SquareRecord {
    SquareRecord::builder()
        .square_number(square)
        .page_number(GridLayout::default().page_of(square))
        .payload(payload(&format!("Business {}", square)))
        .purchased_at(now - Duration::days(1))
        .expires_at(now + Duration::days(30))
        .payment_status(PaymentStatus::Confirmed)
        .build()
}

/// Confirmed purchase whose expiry has already passed but was never swept.
pub fn expired_record(square: u32, now: DateTime<Utc>) -> SquareRecord {
    SquareRecord::builder()
        .square_number(square)
        .page_number(GridLayout::default().page_of(square))
        .payload(payload(&format!("Lapsed {}", square)))
        .purchased_at(now - Duration::days(31))
        .expires_at(now - Duration::minutes(5))
        .payment_status(PaymentStatus::Confirmed)
        .build()
}

/// Purchase still waiting on the payment provider.
pub fn pending_record(square: u32, now: DateTime<Utc>) -> SquareRecord {
    SquareRecord::builder()
        .square_number(square)
        .page_number(GridLayout::default().page_of(square))
        .payload(payload(&format!("Pending {}", square)))
        .purchased_at(now - Duration::minutes(1))
        .expires_at(now + Duration::days(30))
        .build()
}

pub async fn memory_store_with(records: Vec<SquareRecord>) -> Arc<MemorySquareStore> {
    let store = Arc::new(MemorySquareStore::new());
    store.insert_raw(records).await;
    store
}

/// Square currently held by `id` in the store snapshot.
pub fn square_of(records: &[SquareRecord], id: uuid::Uuid) -> u32 {
    records
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.square_number)
        .expect("record present in snapshot")
}
