//! The worker loop: idle → claim attempt → run pipeline → idle.
//!
//! Any number of loops run concurrently without coordination; exclusivity
//! comes entirely from the store's atomic claim transition. A loop holds
//! at most one job at a time and finishes its in-flight job on shutdown.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use codegrade_core::types::DbId;
use codegrade_db::models::status::JobStatus;
use codegrade_db::repositories::JobRepo;
use codegrade_dispatch::JobSignals;
use codegrade_pipeline::JobRunner;

pub struct WorkerLoop {
    /// Loop index, for log correlation only.
    id: usize,
    pool: PgPool,
    signals: Box<dyn JobSignals>,
    runner: Arc<JobRunner>,
    idle_timeout: Duration,
}

impl WorkerLoop {
    pub fn new(
        id: usize,
        pool: PgPool,
        signals: Box<dyn JobSignals>,
        runner: Arc<JobRunner>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            id,
            pool,
            signals,
            runner,
            idle_timeout,
        }
    }

    /// Run until the cancellation token is triggered.
    ///
    /// Store errors are logged and the loop continues; they never bring
    /// the process down.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(worker = self.id, "Worker loop started");

        loop {
            let signal = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(worker = self.id, "Worker loop shutting down");
                    break;
                }
                signal = self.signals.recv(self.idle_timeout) => signal,
            };

            let candidate = match signal {
                Ok(Some(id)) => Some(id),
                // Idle timeout: poll the queue directly so a lost signal
                // costs at most one idle period.
                Ok(None) => match JobRepo::next_queued(&self.pool).await {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::error!(worker = self.id, error = %e, "Queue poll failed");
                        None
                    }
                },
                Err(e) => {
                    tracing::error!(worker = self.id, error = %e, "Dispatch channel error");
                    None
                }
            };

            if let Some(id) = candidate {
                if let Err(e) = self.claim_and_run(id).await {
                    tracing::error!(worker = self.id, job_id = id, error = %e, "Store error during job execution");
                }
            }
        }
    }

    /// Attempt to claim `id`; on success, run the pipeline.
    ///
    /// A lost claim is the expected outcome whenever another worker got
    /// there first; it is skipped silently.
    async fn claim_and_run(&self, id: DbId) -> Result<(), sqlx::Error> {
        let claimed =
            JobRepo::transition(&self.pool, id, JobStatus::Queued, JobStatus::InProgress, None)
                .await?;
        if !claimed {
            tracing::debug!(worker = self.id, job_id = id, "Job already taken");
            return Ok(());
        }

        let Some(job) = JobRepo::find_by_id(&self.pool, id).await? else {
            // Jobs are never deleted while in flight; this would indicate
            // external interference with the table.
            tracing::warn!(worker = self.id, job_id = id, "Claimed job vanished");
            return Ok(());
        };

        tracing::info!(worker = self.id, job_id = id, "Job claimed");
        self.runner.run(&job).await
    }
}
