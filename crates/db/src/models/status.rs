//! Job lifecycle status, backed by the `job_status` Postgres enum type.
//!
//! Because the column is a native enum, the store itself rejects unknown
//! statuses; no caller-supplied string ever reaches a row unchecked.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a grading job.
///
/// Legal transitions:
/// `Queued -> InProgress -> {Done, Failed}`, plus the sweep's reclaim path
/// `InProgress -> Queued` for jobs whose worker died mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Done,
    Failed,
}

impl JobStatus {
    /// Whether the status is terminal. `result` is non-null iff terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in_progress",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}
