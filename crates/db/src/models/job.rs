//! Grading job entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use codegrade_core::types::{DbId, Timestamp};

use super::status::JobStatus;

/// A row from the `grading_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GradingJob {
    pub id: DbId,
    pub status: JobStatus,
    pub userid: String,
    pub assignment_id: String,
    pub assignment_name: String,
    pub assignment_intro: String,
    /// Locator for the submitted artifact, typically a repository URL.
    pub source_ref: String,
    /// Grading prompt text.
    pub question: String,
    /// Opaque rubric payload, passed through unmodified.
    pub rubric: serde_json::Value,
    /// Terminal payload; NULL while the job is queued or in progress.
    pub result: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for enqueueing a new grading job.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueJob {
    pub userid: String,
    pub source_ref: String,
    pub question: String,
    /// Absent rubric is stored as `{}` (no criteria).
    #[serde(default)]
    pub rubric: Option<serde_json::Value>,
    pub assignment_id: String,
    #[serde(default)]
    pub assignment_name: String,
    #[serde(default)]
    pub assignment_intro: String,
}
