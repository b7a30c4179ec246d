//! Job runner: executes the fetch → review → report pipeline for one
//! claimed job and writes the terminal result.
//!
//! Every collaborator failure is caught and normalized into the stored
//! `result` payload; nothing but a store error crosses this boundary. The
//! only way a job stays `in_progress` indefinitely is a process crash,
//! which the sweep recovers.

use std::sync::Arc;

use sqlx::PgPool;

use codegrade_core::evaluation::{JobFailure, JobResult, ReportOutcome};
use codegrade_core::rubric::Rubric;
use codegrade_db::models::job::GradingJob;
use codegrade_db::models::status::JobStatus;
use codegrade_db::repositories::JobRepo;

use crate::fetcher::SourceFetcher;
use crate::notifier::StatusNotifier;
use crate::reporter::GradeReporter;
use crate::review::ReviewEngine;

/// Runs the grading pipeline for claimed jobs.
pub struct JobRunner {
    pool: PgPool,
    fetcher: Arc<dyn SourceFetcher>,
    reviewer: Arc<dyn ReviewEngine>,
    reporter: Arc<dyn GradeReporter>,
    notifier: Option<Arc<dyn StatusNotifier>>,
}

impl JobRunner {
    pub fn new(
        pool: PgPool,
        fetcher: Arc<dyn SourceFetcher>,
        reviewer: Arc<dyn ReviewEngine>,
        reporter: Arc<dyn GradeReporter>,
        notifier: Option<Arc<dyn StatusNotifier>>,
    ) -> Self {
        Self {
            pool,
            fetcher,
            reviewer,
            reporter,
            notifier,
        }
    }

    /// Execute the pipeline for a job already claimed as `in_progress`.
    ///
    /// Returns `Err` only on store failures; the caller logs and moves on.
    pub async fn run(&self, job: &GradingJob) -> Result<(), sqlx::Error> {
        tracing::info!(job_id = job.id, source_ref = %job.source_ref, "Running grading pipeline");

        // Stage 1: fetch the submission.
        let content = match self.fetcher.fetch(&job.source_ref).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(job_id = job.id, error = %e, "Fetch stage failed");
                return self.finish_failed(job, "fetch", &e.to_string()).await;
            }
        };

        // Stage 2: automated review. A rubric that does not decode is a
        // review failure, not a crash.
        let rubric = match Rubric::from_value(&job.rubric) {
            Ok(rubric) => rubric,
            Err(e) => {
                tracing::warn!(job_id = job.id, error = %e, "Stored rubric failed to decode");
                return self
                    .finish_failed(job, "review", &format!("invalid rubric payload: {e}"))
                    .await;
            }
        };
        let evaluation = match self.reviewer.review(&content, &job.question, &rubric).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::warn!(job_id = job.id, error = %e, "Review stage failed");
                return self.finish_failed(job, "review", &e.to_string()).await;
            }
        };

        // Stage 3: report. Once an evaluation exists the job completes
        // regardless; a delivery failure is captured for human follow-up.
        let report = match self
            .reporter
            .report(&job.assignment_id, &job.userid, &evaluation)
            .await
        {
            Ok(response) => ReportOutcome::success(response),
            Err(e) => {
                tracing::warn!(job_id = job.id, error = %e, "Report delivery failed");
                ReportOutcome::failure(e.to_string())
            }
        };
        let report_ok = report.ok;

        let result = JobResult { evaluation, report };
        let payload = serde_json::to_value(&result)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        self.finish(job, JobStatus::Done, &payload).await?;

        tracing::info!(job_id = job.id, report_ok, "Grading pipeline completed");
        self.send_notification(job, "done", if report_ok { "" } else { "report failed" })
            .await;
        Ok(())
    }

    /// Terminal `failed` write plus best-effort notification.
    async fn finish_failed(
        &self,
        job: &GradingJob,
        stage: &str,
        message: &str,
    ) -> Result<(), sqlx::Error> {
        let payload = serde_json::to_value(JobFailure::new(stage, message))
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        self.finish(job, JobStatus::Failed, &payload).await?;
        self.send_notification(job, "failed", message).await;
        Ok(())
    }

    /// Write the terminal transition for a job we hold.
    ///
    /// A `false` here means the sweep reclaimed the job while we ran
    /// (we exceeded the stuck-job timeout); another worker owns it now,
    /// so our result is dropped.
    async fn finish(
        &self,
        job: &GradingJob,
        status: JobStatus,
        payload: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        let written = JobRepo::transition(
            &self.pool,
            job.id,
            JobStatus::InProgress,
            status,
            Some(payload),
        )
        .await?;

        if !written {
            tracing::warn!(
                job_id = job.id,
                status = %status,
                "Terminal write lost ownership (job was reclaimed); result discarded"
            );
        }
        Ok(())
    }

    async fn send_notification(&self, job: &GradingJob, outcome: &str, details: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.notify(job, outcome, details).await {
            tracing::warn!(job_id = job.id, error = %e, "Status notification failed");
        }
    }
}
