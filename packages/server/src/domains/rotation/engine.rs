use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::errors::RotationError;
use super::shuffle::plan_page;
use crate::common::GridLayout;
use crate::domains::squares::lifecycle::is_active;
use crate::domains::squares::models::square::SquareRecord;
use crate::domains::squares::store::{PageAssignment, SquareStore};
use crate::kernel::{GridEvent, StreamHub};

/// A page whose reassignment was rejected or failed to commit.
///
/// The page keeps its pre-rotation layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFailure {
    pub page: u32,
    pub reason: String,
}

/// Outcome of one rotation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationResult {
    pub rotated_at: DateTime<Utc>,
    /// Records whose square number actually changed.
    pub moved_count: usize,
    pub pages_rotated: Vec<u32>,
    pub failed_pages: Vec<PageFailure>,
}

/// Permutes active records within their pages.
///
/// The engine itself does not serialize passes; `RotationScheduler` guarantees
/// at most one `rotate` runs at a time.
pub struct RotationEngine {
    store: Arc<dyn SquareStore>,
    layout: GridLayout,
    rng: Mutex<StdRng>,
    stream_hub: Option<StreamHub>,
}

impl RotationEngine {
    pub fn new(store: Arc<dyn SquareStore>, layout: GridLayout) -> Self {
        Self {
            store,
            layout,
            rng: Mutex::new(StdRng::from_entropy()),
            stream_hub: None,
        }
    }

    /// Use a fixed random source (reproducible tests).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Announce completed passes on this hub.
    pub fn with_stream_hub(mut self, hub: StreamHub) -> Self {
        self.stream_hub = Some(hub);
        self
    }

    pub fn store(&self) -> &Arc<dyn SquareStore> {
        &self.store
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Run one rotation pass at `now`.
    ///
    /// Pages are written concurrently, each as its own atomic unit. A page
    /// that fails is reported in `failed_pages` and never retried here.
    pub async fn rotate(&self, now: DateTime<Utc>) -> Result<RotationResult, RotationError> {
        let records = self.store.active_records(now).await?;

        let mut pages: BTreeMap<u32, Vec<SquareRecord>> = BTreeMap::new();
        for record in records.into_iter().filter(|r| is_active(r, now)) {
            pages
                .entry(self.layout.page_of(record.square_number))
                .or_default()
                .push(record);
        }

        let plans: Vec<PageAssignment> = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            pages
                .iter()
                .filter(|(_, records)| records.len() >= 2)
                .map(|(page, records)| plan_page(*page, records, &mut *rng))
                .filter(|plan| !plan.moves.is_empty())
                .collect()
        };

        debug!(
            active_pages = pages.len(),
            planned_pages = plans.len(),
            "rotation planned"
        );

        let outcomes = join_all(plans.iter().map(|plan| async move {
            let outcome = self.store.apply_page_assignment(plan, now).await;
            (plan, outcome)
        }))
        .await;

        let mut result = RotationResult {
            rotated_at: now,
            moved_count: 0,
            pages_rotated: Vec::new(),
            failed_pages: Vec::new(),
        };

        for (plan, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    debug!(page = plan.page, moved = plan.moves.len(), "page rotated");
                    result.moved_count += plan.moves.len();
                    result.pages_rotated.push(plan.page);
                }
                Err(e) => {
                    warn!(page = plan.page, error = %e, "page rotation failed, layout unchanged");
                    result.failed_pages.push(PageFailure {
                        page: plan.page,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            moved = result.moved_count,
            pages = result.pages_rotated.len(),
            failed_pages = result.failed_pages.len(),
            "rotation pass complete"
        );

        if result.moved_count > 0 {
            if let Some(hub) = &self.stream_hub {
                hub.publish(GridEvent::RotationCompleted {
                    moved_count: result.moved_count,
                    rotated_at: now,
                    pages: result.pages_rotated.clone(),
                });
            }
        }

        Ok(result)
    }

    /// Retire records whose expiry has passed, freeing their squares.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, RotationError> {
        let retired = self.store.mark_expired(now).await?;
        if retired > 0 {
            info!(retired, "expired squares released");
            if let Some(hub) = &self.stream_hub {
                hub.publish(GridEvent::SquaresExpired {
                    count: retired,
                    swept_at: now,
                });
            }
        }
        Ok(retired)
    }
}
