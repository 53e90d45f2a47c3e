use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::humanize_interval;
use crate::domains::squares::store::SquareStore;
use crate::domains::squares::StoreError;

/// Rotation counters as reported to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationStats {
    pub total_purchases: u64,
    pub shuffled_purchases: u64,
    pub last_shuffle: Option<DateTime<Utc>>,
    pub shuffle_interval: String,
}

/// Read-only aggregation over the store. Never touches rotation state.
#[derive(Clone)]
pub struct StatsReporter {
    store: Arc<dyn SquareStore>,
    interval: Duration,
}

impl StatsReporter {
    pub fn new(store: Arc<dyn SquareStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub async fn report(&self) -> Result<RotationStats, StoreError> {
        let stats = self.store.stats().await?;
        Ok(RotationStats {
            total_purchases: stats.total_records,
            shuffled_purchases: stats.shuffled_records,
            last_shuffle: stats.last_shuffled_at,
            shuffle_interval: humanize_interval(self.interval),
        })
    }
}
