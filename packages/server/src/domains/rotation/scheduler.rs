//! Rotation scheduler.
//!
//! Two triggers feed the same `rotate` call:
//! - **Timer**: fires one interval after the last successful rotation. If the
//!   process was down past that point, the next tick rotates immediately.
//! - **Manual**: an administrator request. Runs now and restarts the interval
//!   from its own timestamp.
//!
//! All passes serialize on one engine-wide lock. A timer tick that finds a
//! rotation in flight is dropped (the in-flight pass moves the reference
//! point anyway); a manual request queues behind it and then runs.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::engine::{RotationEngine, RotationResult};
use super::errors::RotationError;
use crate::common::humanize_interval;

/// Upper bound on how long the loop backs off after a failed pass.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Manual,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Timer => "timer",
            Trigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Completed(RotationResult),
    /// Another rotation was in flight; this trigger was folded into it.
    Coalesced,
}

pub struct RotationScheduler {
    engine: Arc<RotationEngine>,
    interval: Duration,
    rotation_lock: AsyncMutex<()>,
    last_rotation: Mutex<Option<DateTime<Utc>>>,
    reset: Notify,
}

impl RotationScheduler {
    pub fn new(engine: Arc<RotationEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            rotation_lock: AsyncMutex::new(()),
            last_rotation: Mutex::new(None),
            reset: Notify::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn engine(&self) -> &Arc<RotationEngine> {
        &self.engine
    }

    /// Reference point of the timer: the last successful rotation.
    pub fn last_rotation(&self) -> Option<DateTime<Utc>> {
        *self.last_rotation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation_lock.try_lock().is_err()
    }

    /// How long until the timer is due, measured at `now`. Zero when overdue
    /// or when no rotation has ever run.
    pub fn time_until_due(&self, now: DateTime<Utc>) -> Duration {
        let Some(last) = self.last_rotation() else {
            return Duration::ZERO;
        };
        let Ok(interval) = chrono::Duration::from_std(self.interval) else {
            return self.interval;
        };
        (last + interval - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Administrator trigger. Waits for any in-flight rotation, then runs.
    ///
    /// The pass runs on its own task: dropping the returned future (request
    /// timeout, client gone) does not cancel it. Once requested, the pass
    /// completes, moves the reference point and announces itself.
    pub async fn trigger_manual(self: &Arc<Self>) -> Result<RotationResult, RotationError> {
        let scheduler = Arc::clone(self);
        let pass = tokio::spawn(async move {
            let _guard = scheduler.rotation_lock.lock().await;
            let result = scheduler.run_locked(Trigger::Manual).await?;
            // Wake the timer loop so it measures from the new reference point
            scheduler.reset.notify_one();
            Ok::<_, RotationError>(result)
        });
        pass.await?
    }

    /// Timer trigger. Dropped if a rotation is already running.
    pub async fn tick(&self) -> Result<TriggerOutcome, RotationError> {
        let Ok(_guard) = self.rotation_lock.try_lock() else {
            debug!("rotation in flight, timer tick coalesced");
            return Ok(TriggerOutcome::Coalesced);
        };
        let result = self.run_locked(Trigger::Timer).await?;
        Ok(TriggerOutcome::Completed(result))
    }

    /// Must be called with `rotation_lock` held.
    async fn run_locked(&self, trigger: Trigger) -> Result<RotationResult, RotationError> {
        let now = Utc::now();
        info!(trigger = trigger.as_str(), "rotation starting");

        self.engine.sweep_expired(now).await?;
        let result = self.engine.rotate(now).await?;

        *self
            .last_rotation
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(now);
        Ok(result)
    }

    /// Restore the reference point from the store after a restart.
    ///
    /// Only passes that moved a record leave a `last_shuffled_at` stamp, so
    /// after a restart following a no-op pass the timer measures from the
    /// last pass that moved something and may rotate early.
    async fn seed_reference(&self) {
        if self.last_rotation().is_some() {
            return;
        }
        match self.engine.store().stats().await {
            Ok(stats) => {
                *self
                    .last_rotation
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = stats.last_shuffled_at;
            }
            Err(e) => warn!(error = %e, "could not read last rotation time, rotating on first tick"),
        }
    }

    /// Drive timer rotations until `shutdown` is cancelled.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        self.seed_reference().await;
        info!(
            interval = %humanize_interval(self.interval),
            last_rotation = ?self.last_rotation(),
            "rotation scheduler started"
        );

        let retry_delay = self.interval.min(MAX_RETRY_DELAY);

        loop {
            let wait = self.time_until_due(Utc::now());

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.reset.notified() => continue,
                _ = tokio::time::sleep(wait) => {}
            }

            match self.tick().await {
                Ok(TriggerOutcome::Completed(result)) => {
                    debug!(moved = result.moved_count, "scheduled rotation finished");
                }
                Ok(TriggerOutcome::Coalesced) => {
                    // Let the in-flight pass finish; it resets the reference
                    drop(self.rotation_lock.lock().await);
                }
                Err(e) => {
                    error!(error = %e, "scheduled rotation failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(retry_delay) => {}
                    }
                }
            }
        }

        info!("rotation scheduler stopped");
    }
}
