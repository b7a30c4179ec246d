//! Repository for the `grading_jobs` table.
//!
//! `transition` is the only mutator after insert. It is a single
//! conditional UPDATE, which is what makes the claim protocol safe with
//! any number of concurrent workers and no external lock manager.

use sqlx::PgPool;

use codegrade_core::submission::validate_enqueue;
use codegrade_core::types::{DbId, Timestamp};
use codegrade_core::CoreError;

use crate::models::job::{EnqueueJob, GradingJob};
use crate::models::status::JobStatus;

/// NOTIFY channel carrying newly enqueued job ids.
pub const DISPATCH_CHANNEL: &str = "grading_jobs";

/// Column list for `grading_jobs` queries.
const COLUMNS: &str = "\
    id, status, userid, assignment_id, assignment_name, assignment_intro, \
    source_ref, question, rubric, result, created_at, updated_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 50;

/// Errors from [`JobRepo::enqueue`].
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    /// Input rejected before any row was created.
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Provides persistence operations for grading jobs.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new queued job and emit its dispatch signal.
    ///
    /// The INSERT and the `pg_notify` run in one transaction, so a visible
    /// row always has had its signal sent (at-least-once; a lost signal is
    /// recovered by the sweep). Rejects blank `userid`, `source_ref`, or
    /// `question` before touching the database.
    pub async fn enqueue(pool: &PgPool, input: &EnqueueJob) -> Result<GradingJob, EnqueueError> {
        validate_enqueue(&input.userid, &input.source_ref, &input.question)?;

        let rubric = input
            .rubric
            .clone()
            .unwrap_or_else(|| serde_json::json!({}));

        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO grading_jobs \
             (userid, source_ref, question, rubric, assignment_id, assignment_name, assignment_intro) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, GradingJob>(&query)
            .bind(&input.userid)
            .bind(&input.source_ref)
            .bind(&input.question)
            .bind(&rubric)
            .bind(&input.assignment_id)
            .bind(&input.assignment_name)
            .bind(&input.assignment_intro)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(DISPATCH_CHANNEL)
            .bind(job.id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(job)
    }

    /// Fetch a job by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<GradingJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM grading_jobs WHERE id = $1");
        sqlx::query_as::<_, GradingJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs, newest first, for status dashboards.
    pub async fn list_all(pool: &PgPool, limit: Option<i64>) -> Result<Vec<GradingJob>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM grading_jobs ORDER BY created_at DESC, id DESC LIMIT $1"
        );
        sqlx::query_as::<_, GradingJob>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Atomically move a job from `expected` to `new`, writing `result`.
    ///
    /// Succeeds iff the row's current status equals `expected`; otherwise
    /// it is a no-op returning `false` (a lost claim race, not an error).
    /// `result` must be `Some` exactly for terminal targets. Passing
    /// `None` on a reclaim clears nothing because non-terminal rows never
    /// carry a result.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        expected: JobStatus,
        new: JobStatus,
        result: Option<&serde_json::Value>,
    ) -> Result<bool, sqlx::Error> {
        let updated = sqlx::query(
            "UPDATE grading_jobs \
             SET status = $3, result = $4, updated_at = NOW() \
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .bind(result)
        .execute(pool)
        .await?;
        Ok(updated.rows_affected() > 0)
    }

    /// Ids of jobs sitting in `status` since before `cutoff`.
    ///
    /// Used by the sweep to find stuck `in_progress` rows and `queued`
    /// rows whose dispatch signal was lost.
    pub async fn stalled(
        pool: &PgPool,
        status: JobStatus,
        cutoff: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM grading_jobs \
             WHERE status = $1 AND updated_at < $2 \
             ORDER BY updated_at ASC",
        )
        .bind(status)
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }

    /// Oldest queued job id, if any. Poll-path fallback for worker loops.
    pub async fn next_queued(pool: &PgPool) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM grading_jobs \
             WHERE status = 'queued' \
             ORDER BY created_at ASC, id ASC \
             LIMIT 1",
        )
        .fetch_optional(pool)
        .await
    }

    /// Re-publish the dispatch signal for a job id.
    pub async fn notify(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(DISPATCH_CHANNEL)
            .bind(id.to_string())
            .execute(pool)
            .await?;
        Ok(())
    }
}
