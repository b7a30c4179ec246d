//! Evaluation and terminal-result payload types.
//!
//! [`Evaluation`] is the structured outcome of an automated review: one
//! entry per rubric criterion plus an overall feedback comment. It is
//! decoded exactly once, at the review-engine boundary, and flows through
//! the reporter and the stored `result` payload without re-parsing.

use serde::{Deserialize, Deserializer, Serialize};

/// A structured code review: per-criterion results and an overall comment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evaluation {
    /// One entry per graded rubric criterion.
    #[serde(default, rename = "criteria_results")]
    pub entries: Vec<EvaluationEntry>,
    /// Overall feedback comment for the submission.
    #[serde(default, rename = "feedback_comment")]
    pub comment: String,
}

/// One graded criterion: which level was selected and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationEntry {
    /// Criterion description as echoed by the reviewer.
    #[serde(default)]
    pub criteria: String,
    /// Rubric criterion id. Reviewers emit this as a number or a string.
    #[serde(deserialize_with = "loose_id")]
    pub criterionid: String,
    /// Selected level id within the criterion.
    #[serde(deserialize_with = "loose_id")]
    pub levelid: String,
    /// Reviewer's remark for this criterion.
    #[serde(default)]
    pub remark: String,
}

/// Outcome of delivering an evaluation to the grading platform.
///
/// A failed delivery does not fail the job once the evaluation exists; it
/// is recorded here so a human can re-deliver from the stored payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub ok: bool,
    /// Platform response body, when one was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    /// Delivery error description, when delivery failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportOutcome {
    pub fn success(response: serde_json::Value) -> Self {
        Self {
            ok: true,
            response: Some(response),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            response: None,
            error: Some(error.into()),
        }
    }
}

/// Terminal `result` payload for a job that reached `done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub evaluation: Evaluation,
    pub report: ReportOutcome,
}

/// Terminal `result` payload for a job that reached `failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFailure {
    pub error: StageError,
}

/// Which pipeline stage failed and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    /// `"fetch"` or `"review"`; report failures do not fail jobs.
    pub stage: String,
    pub message: String,
}

impl JobFailure {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: StageError {
                stage: stage.into(),
                message: message.into(),
            },
        }
    }
}

/// Accept ids serialized as JSON strings or numbers; normalize to `String`.
pub(crate) fn loose_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}
