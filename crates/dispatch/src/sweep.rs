//! Periodic recovery of stuck and missed jobs.
//!
//! The sweep is the correctness backstop for the notify-based dispatch
//! channel: it finds `in_progress` rows whose worker died (reclaiming them
//! to `queued`) and `queued` rows whose dispatch signal was lost
//! (re-publishing their id). With the sweep running, every job makes
//! progress even if every NOTIFY is dropped.
//!
//! Known trade-off: a worker that crashes after the external grade report
//! succeeded but before the terminal write will have its job reclaimed and
//! re-executed, producing a duplicate report on the grading platform. This
//! is accepted; the alternative (holding a transaction across external
//! calls) would block other workers.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use codegrade_db::models::status::JobStatus;
use codegrade_db::repositories::JobRepo;

/// Default interval between sweep cycles.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default age after which an `in_progress` job is considered stuck.
const DEFAULT_STUCK_TIMEOUT: Duration = Duration::from_secs(600);

/// Default age after which a `queued` job is assumed to have missed its
/// dispatch signal.
const DEFAULT_MISSED_TIMEOUT: Duration = Duration::from_secs(60);

/// Tunables for the sweep loop.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often a sweep cycle runs.
    pub interval: Duration,
    /// `in_progress` older than this is reclaimed to `queued`.
    pub stuck_timeout: Duration,
    /// `queued` older than this is re-notified.
    pub missed_timeout: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            stuck_timeout: DEFAULT_STUCK_TIMEOUT,
            missed_timeout: DEFAULT_MISSED_TIMEOUT,
        }
    }
}

/// Background task that recovers stuck and missed jobs.
pub struct Sweep {
    pool: PgPool,
    config: SweepConfig,
}

impl Sweep {
    pub fn new(pool: PgPool, config: SweepConfig) -> Self {
        Self { pool, config }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            stuck_timeout_secs = self.config.stuck_timeout.as_secs(),
            missed_timeout_secs = self.config.missed_timeout.as_secs(),
            "Sweep started",
        );

        let mut interval = tokio::time::interval(self.config.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Sweep shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.cycle().await {
                        tracing::error!(error = %e, "Sweep cycle failed");
                    }
                }
            }
        }
    }

    /// One sweep cycle: reclaim stuck jobs, re-notify missed ones.
    pub async fn cycle(&self) -> Result<(), sqlx::Error> {
        let now = Utc::now();

        // Stuck in_progress: the worker died mid-pipeline. Reclaim to
        // queued first so a live worker can claim it normally, then wake
        // the workers. A non-stuck row racing us simply loses the
        // conditional transition.
        let stuck_cutoff = now - chrono::Duration::seconds(self.config.stuck_timeout.as_secs() as i64);
        for id in JobRepo::stalled(&self.pool, JobStatus::InProgress, stuck_cutoff).await? {
            let reclaimed =
                JobRepo::transition(&self.pool, id, JobStatus::InProgress, JobStatus::Queued, None)
                    .await?;
            if reclaimed {
                tracing::warn!(job_id = id, "Reclaimed stuck in_progress job");
                JobRepo::notify(&self.pool, id).await?;
            }
        }

        // Stale queued: the original NOTIFY was lost (or no worker was
        // listening). Re-publish the signal; claiming stays idempotent.
        let missed_cutoff = now - chrono::Duration::seconds(self.config.missed_timeout.as_secs() as i64);
        for id in JobRepo::stalled(&self.pool, JobStatus::Queued, missed_cutoff).await? {
            tracing::debug!(job_id = id, "Re-publishing dispatch signal for stale queued job");
            JobRepo::notify(&self.pool, id).await?;
        }

        Ok(())
    }
}
