//! Pipeline error taxonomy.
//!
//! These never escape the [`JobRunner`](crate::runner::JobRunner): each is
//! normalized into the job's terminal `result` payload. Only store errors
//! propagate to the caller.

/// Failure retrieving the submitted artifact.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout).
    #[error("Fetch transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The source responded with a non-success status.
    #[error("Fetch failed with status {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Failure obtaining a structured evaluation from the review engine.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// Transport-level failure reaching the review endpoint.
    #[error("Review transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The review endpoint responded with a non-success status.
    #[error("Review service returned status {0}")]
    Status(u16),

    /// The response arrived but did not decode as an evaluation.
    ///
    /// Carries a truncated sample of the raw text for diagnosis.
    #[error("Review response was not a valid evaluation: {reason}")]
    Unparsable { reason: String, raw: String },

    /// The rubric stored on the job could not be decoded.
    #[error("Invalid rubric payload: {0}")]
    InvalidRubric(#[from] serde_json::Error),
}

/// Failure delivering the evaluation to the grading platform.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Grading platform returned status {0}")]
    Status(u16),
}

/// Failure sending a best-effort status report. Logged, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notify transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Status sink returned status {0}")]
    Status(u16),
}
