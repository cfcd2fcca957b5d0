//! Grid-aligned snapshot timer

use super::writer::{SnapshotOutcome, SnapshotWriter};
use crate::bucket::{self, Bucket};
use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Which bucket a firing captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotTarget {
    /// Bucket containing the firing instant
    Current,
    /// Bucket that ended just before the firing instant
    #[default]
    Closed,
}

/// Bucket to capture for a firing at `firing`
pub fn target_bucket(firing: NaiveDateTime, target: SnapshotTarget) -> Bucket {
    match target {
        SnapshotTarget::Current => Bucket::containing(firing),
        SnapshotTarget::Closed => Bucket::containing(firing - Duration::seconds(1)),
    }
}

/// Wall-clock lag or lead tolerated before a tick is re-aligned
const CLOCK_TOLERANCE_SECS: i64 = 5;

/// Logical firing time for a tick scheduled for `scheduled` whose deadline
/// passed at wall time `now`.
///
/// Ticks come from the monotonic clock. When the wall clock has moved away
/// from the schedule (clock step, suspend, DST) the firing snaps back to the
/// grid boundary at or before `now`.
pub fn resync_firing(scheduled: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    if (now - scheduled).num_seconds().abs() > CLOCK_TOLERANCE_SECS {
        bucket::bucket_start(now)
    } else {
        scheduled
    }
}

/// Fires the snapshot job on every bucket boundary.
///
/// Firings are scheduled as previous + width, so the grid never drifts;
/// firings missed while a job ran long are caught up back to back. Each tick
/// is checked against the wall clock and the timer restarts on the wall-clock
/// grid when the two disagree.
pub struct SnapshotScheduler {
    writer: SnapshotWriter,
    target: SnapshotTarget,
}

impl SnapshotScheduler {
    pub fn new(writer: SnapshotWriter, target: SnapshotTarget) -> Self {
        Self { writer, target }
    }

    /// Run until `shutdown` resolves. Returns the number of firings.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> usize {
        let now = Local::now().naive_local();
        let mut firing = bucket::next_grid_boundary(now);
        let mut ticker = grid_ticker(now, firing);

        tracing::info!(
            first_firing = %bucket::format_timestamp(firing),
            target = ?self.target,
            "Snapshot scheduler started"
        );

        tokio::pin!(shutdown);
        let mut firings = 0;

        loop {
            let deadline = tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!(firings, "Snapshot scheduler shutting down");
                    break;
                }

                deadline = ticker.tick() => deadline,
            };

            let now = Local::now().naive_local();
            // catch-up ticks are late on both clocks; only the difference counts
            let lateness = Duration::from_std(deadline.elapsed()).unwrap_or_else(|_| Duration::zero());
            let (fired, _) = self.fire_at(firing, now - lateness);
            firings += 1;

            if fired == firing {
                firing += bucket::width();
            } else {
                firing = bucket::next_grid_boundary(now);
                ticker = grid_ticker(now, firing);
            }
        }

        firings
    }

    /// Run the job for a tick scheduled at `scheduled`; `now` is the wall
    /// time at the tick's monotonic deadline.
    ///
    /// Returns the logical firing time actually used.
    pub fn fire_at(
        &self,
        scheduled: NaiveDateTime,
        now: NaiveDateTime,
    ) -> (NaiveDateTime, Option<SnapshotOutcome>) {
        let firing = resync_firing(scheduled, now);
        if firing != scheduled {
            tracing::warn!(
                scheduled = %bucket::format_timestamp(scheduled),
                now = %bucket::format_timestamp(now),
                firing = %bucket::format_timestamp(firing),
                "Wall clock moved, re-aligning snapshot grid"
            );
        }
        (firing, self.fire(firing))
    }

    /// Run one job for the logical firing time `firing`
    pub fn fire(&self, firing: NaiveDateTime) -> Option<SnapshotOutcome> {
        let target = target_bucket(firing, self.target);
        match self.writer.snapshot_bucket(target) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(error = %e, bucket = %target, "Snapshot job failed");
                None
            }
        }
    }
}

/// Interval firing first at wall-clock `first`, then every bucket width
fn grid_ticker(now: NaiveDateTime, first: NaiveDateTime) -> Interval {
    let delay = (first - now).to_std().unwrap_or_default();
    let period = bucket::width().to_std().unwrap_or_default();
    let mut ticker = tokio::time::interval_at(Instant::now() + delay, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    ticker
}
