use std::collections::HashMap;
use std::ops::RangeInclusive;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PageAssignment, SquareStore, StoreStats};
use crate::domains::squares::errors::StoreError;
use crate::domains::squares::lifecycle::is_active;
use crate::domains::squares::models::square::{PaymentStatus, SquareRecord};

/// In-process store.
///
/// Every mutation runs under one write lock, so a page reassignment is
/// trivially atomic with respect to purchases.
#[derive(Default)]
pub struct MemorySquareStore {
    records: RwLock<HashMap<Uuid, SquareRecord>>,
}

impl MemorySquareStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed records directly, bypassing the purchase checks (tests, fixtures).
    pub async fn insert_raw(&self, records: impl IntoIterator<Item = SquareRecord>) {
        let mut guard = self.records.write().await;
        for record in records {
            guard.insert(record.id, record);
        }
    }

    /// Snapshot of every stored record, retired ones included.
    pub async fn all(&self) -> Vec<SquareRecord> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by_key(|r| (r.square_number, r.purchased_at));
        records
    }
}

fn active_squares_on_page(
    records: &HashMap<Uuid, SquareRecord>,
    page: u32,
    now: DateTime<Utc>,
) -> Vec<u32> {
    let mut squares: Vec<u32> = records
        .values()
        .filter(|r| r.page_number == page && is_active(r, now))
        .map(|r| r.square_number)
        .collect();
    squares.sort_unstable();
    squares
}

#[async_trait]
impl SquareStore for MemorySquareStore {
    async fn insert_pending(
        &self,
        record: SquareRecord,
        now: DateTime<Utc>,
    ) -> Result<SquareRecord, StoreError> {
        let mut records = self.records.write().await;

        let occupied = records
            .values()
            .any(|r| r.square_number == record.square_number && r.holds_square(now));
        if occupied {
            return Err(StoreError::SquareOccupied(record.square_number));
        }

        let record = SquareRecord {
            payment_status: PaymentStatus::Pending,
            retired_at: None,
            last_shuffled_at: None,
            ..record
        };
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn confirm_payment(&self, id: Uuid) -> Result<SquareRecord, StoreError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.payment_status != PaymentStatus::Pending {
            return Err(StoreError::NotPending(id));
        }
        record.payment_status = PaymentStatus::Confirmed;
        Ok(record.clone())
    }

    async fn cancel_pending(&self, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        match records.get(&id) {
            None => Err(StoreError::NotFound(id)),
            Some(r) if r.payment_status != PaymentStatus::Pending => Err(StoreError::NotPending(id)),
            Some(_) => {
                records.remove(&id);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SquareRecord>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list_squares(
        &self,
        squares: RangeInclusive<u32>,
    ) -> Result<Vec<SquareRecord>, StoreError> {
        let mut found: Vec<SquareRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.retired_at.is_none() && squares.contains(&r.square_number))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.square_number);
        Ok(found)
    }

    async fn active_records(&self, now: DateTime<Utc>) -> Result<Vec<SquareRecord>, StoreError> {
        let mut active: Vec<SquareRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| is_active(r, now))
            .cloned()
            .collect();
        active.sort_by_key(|r| r.square_number);
        Ok(active)
    }

    async fn apply_page_assignment(
        &self,
        assignment: &PageAssignment,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let page = assignment.page;

        if active_squares_on_page(&records, page, now) != assignment.occupied {
            return Err(StoreError::OccupancyChanged { page });
        }

        for mv in &assignment.moves {
            match records.get(&mv.record_id) {
                Some(r) if r.square_number == mv.from && r.page_number == page => {}
                _ => return Err(StoreError::OccupancyChanged { page }),
            }
        }

        // Check the resulting layout before touching any record
        let targets: HashMap<Uuid, u32> = assignment
            .moves
            .iter()
            .map(|mv| (mv.record_id, mv.to))
            .collect();
        let mut after: Vec<u32> = records
            .values()
            .filter(|r| r.page_number == page && is_active(r, now))
            .map(|r| targets.get(&r.id).copied().unwrap_or(r.square_number))
            .collect();
        after.sort_unstable();
        if after != assignment.occupied {
            return Err(StoreError::Internal(anyhow!(
                "reassignment of page {} is not a permutation of its occupants",
                page
            )));
        }

        for (id, to) in targets {
            if let Some(r) = records.get_mut(&id) {
                r.square_number = to;
                r.last_shuffled_at = Some(now);
            }
        }
        Ok(())
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let mut retired = 0;
        for record in records.values_mut() {
            if record.retired_at.is_none() && now >= record.expires_at {
                record.retired_at = Some(now);
                retired += 1;
            }
        }
        Ok(retired)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let records = self.records.read().await;
        Ok(StoreStats {
            total_records: records.len() as u64,
            shuffled_records: records
                .values()
                .filter(|r| r.last_shuffled_at.is_some())
                .count() as u64,
            last_shuffled_at: records.values().filter_map(|r| r.last_shuffled_at).max(),
        })
    }
}
