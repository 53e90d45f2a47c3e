//! Persistence for square records.
//!
//! `SquareStore` is the engine's only persistent dependency. The memory
//! adapter backs tests and single-node development; the Postgres adapter is
//! used whenever `DATABASE_URL` is configured.

mod memory;
mod postgres;

pub use memory::MemorySquareStore;
pub use postgres::PostgresSquareStore;

use std::ops::RangeInclusive;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::errors::StoreError;
use super::models::square::SquareRecord;

/// One record moving from one square to another on the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquareMove {
    pub record_id: Uuid,
    pub from: u32,
    pub to: u32,
}

/// A page's complete reassignment, committed all-or-nothing.
///
/// `occupied` is the sorted set of squares held by active records when the
/// page was read. The write is rejected with `OccupancyChanged` if the page
/// no longer looks like that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAssignment {
    pub page: u32,
    pub occupied: Vec<u32>,
    pub moves: Vec<SquareMove>,
}

/// Raw aggregates used by the stats reporter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total_records: u64,
    pub shuffled_records: u64,
    pub last_shuffled_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SquareStore: Send + Sync {
    /// Insert a record awaiting payment. Fails with `SquareOccupied` if another
    /// record still holds the square at `now`.
    async fn insert_pending(
        &self,
        record: SquareRecord,
        now: DateTime<Utc>,
    ) -> Result<SquareRecord, StoreError>;

    /// Mark a pending record's payment as confirmed.
    async fn confirm_payment(&self, id: Uuid) -> Result<SquareRecord, StoreError>;

    /// Delete a record whose payment never completed.
    async fn cancel_pending(&self, id: Uuid) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SquareRecord>, StoreError>;

    /// Unretired records whose square lies in `squares`, ordered by square.
    async fn list_squares(
        &self,
        squares: RangeInclusive<u32>,
    ) -> Result<Vec<SquareRecord>, StoreError>;

    /// Records eligible for rotation at `now`, ordered by square.
    async fn active_records(&self, now: DateTime<Utc>) -> Result<Vec<SquareRecord>, StoreError>;

    /// Apply one page's reassignment atomically, conditioned on the page's
    /// active occupancy being unchanged since it was read.
    async fn apply_page_assignment(
        &self,
        assignment: &PageAssignment,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Retire records whose expiry has passed. Returns how many were retired.
    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;
}
