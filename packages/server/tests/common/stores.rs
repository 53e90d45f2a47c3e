//! Store wrappers that inject latency or failures around the memory store.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grid_core::domains::squares::{
    MemorySquareStore, PageAssignment, SquareRecord, SquareStore, StoreError, StoreStats,
};
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

fn unreachable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

/// Blocks `active_records` until the test releases it, so a rotation can be
/// held in flight.
pub struct GatedStore {
    pub inner: Arc<MemorySquareStore>,
    gate: Semaphore,
    entered: Notify,
}

impl GatedStore {
    pub fn new(inner: Arc<MemorySquareStore>) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            entered: Notify::new(),
        }
    }

    /// Wait until a rotation is parked inside the store.
    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    /// Let `n` parked reads continue.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

/// Fails every write to one page; everything else hits the memory store.
pub struct FailingPageStore {
    pub inner: Arc<MemorySquareStore>,
    pub failing_page: u32,
}

/// Writes to one page take `delay` before reaching the memory store.
pub struct SlowPageStore {
    pub inner: Arc<MemorySquareStore>,
    pub slow_page: u32,
    pub delay: Duration,
}

/// Every call fails as if the database were down.
pub struct UnreachableStore;

/// Implements `SquareStore` for a wrapper with an `inner` memory store,
/// delegating everything except the two rotation calls given in the body.
macro_rules! wrapping_store {
    ($wrapper:ty, { $($rotation_calls:tt)* }) => {
        #[async_trait]
        impl SquareStore for $wrapper {
            async fn insert_pending(
                &self,
                record: SquareRecord,
                now: DateTime<Utc>,
            ) -> Result<SquareRecord, StoreError> {
                self.inner.insert_pending(record, now).await
            }

            async fn confirm_payment(&self, id: Uuid) -> Result<SquareRecord, StoreError> {
                self.inner.confirm_payment(id).await
            }

            async fn cancel_pending(&self, id: Uuid) -> Result<(), StoreError> {
                self.inner.cancel_pending(id).await
            }

            async fn find_by_id(&self, id: Uuid) -> Result<Option<SquareRecord>, StoreError> {
                self.inner.find_by_id(id).await
            }

            async fn list_squares(
                &self,
                squares: RangeInclusive<u32>,
            ) -> Result<Vec<SquareRecord>, StoreError> {
                self.inner.list_squares(squares).await
            }

            async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
                self.inner.mark_expired(now).await
            }

            async fn stats(&self) -> Result<StoreStats, StoreError> {
                self.inner.stats().await
            }

            $($rotation_calls)*
        }
    };
}

wrapping_store!(GatedStore, {
    async fn active_records(&self, now: DateTime<Utc>) -> Result<Vec<SquareRecord>, StoreError> {
        self.entered.notify_one();
        let permit = self.gate.acquire().await.map_err(|e| anyhow::anyhow!(e))?;
        permit.forget();
        self.inner.active_records(now).await
    }

    async fn apply_page_assignment(
        &self,
        assignment: &PageAssignment,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.apply_page_assignment(assignment, now).await
    }
});

wrapping_store!(FailingPageStore, {
    async fn active_records(&self, now: DateTime<Utc>) -> Result<Vec<SquareRecord>, StoreError> {
        self.inner.active_records(now).await
    }

    async fn apply_page_assignment(
        &self,
        assignment: &PageAssignment,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if assignment.page == self.failing_page {
            return Err(unreachable());
        }
        self.inner.apply_page_assignment(assignment, now).await
    }
});

wrapping_store!(SlowPageStore, {
    async fn active_records(&self, now: DateTime<Utc>) -> Result<Vec<SquareRecord>, StoreError> {
        self.inner.active_records(now).await
    }

    async fn apply_page_assignment(
        &self,
        assignment: &PageAssignment,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if assignment.page == self.slow_page {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.apply_page_assignment(assignment, now).await
    }
});

#[async_trait]
impl SquareStore for UnreachableStore {
    async fn insert_pending(
        &self,
        _record: SquareRecord,
        _now: DateTime<Utc>,
    ) -> Result<SquareRecord, StoreError> {
        Err(unreachable())
    }

    async fn confirm_payment(&self, _id: Uuid) -> Result<SquareRecord, StoreError> {
        Err(unreachable())
    }

    async fn cancel_pending(&self, _id: Uuid) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<SquareRecord>, StoreError> {
        Err(unreachable())
    }

    async fn list_squares(
        &self,
        _squares: RangeInclusive<u32>,
    ) -> Result<Vec<SquareRecord>, StoreError> {
        Err(unreachable())
    }

    async fn active_records(&self, _now: DateTime<Utc>) -> Result<Vec<SquareRecord>, StoreError> {
        Err(unreachable())
    }

    async fn apply_page_assignment(
        &self,
        _assignment: &PageAssignment,
        _now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn mark_expired(&self, _now: DateTime<Utc>) -> Result<u64, StoreError> {
        Err(unreachable())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        Err(unreachable())
    }
}
