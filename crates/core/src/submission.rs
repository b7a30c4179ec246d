//! Submission field validation.
//!
//! Pure functions used by both the DB and API layers to reject bad enqueue
//! input before a row is created.

use crate::error::CoreError;

/// Maximum length for a submission source reference (URL).
pub const MAX_SOURCE_REF_LEN: usize = 2048;

/// Maximum length for the grading question text.
pub const MAX_QUESTION_LEN: usize = 50_000;

/// Validate the required enqueue fields.
///
/// `userid`, `source_ref`, and `question` must all be non-blank; a job
/// missing any of them can never complete the pipeline, so it is rejected
/// up front with a [`CoreError::Validation`].
pub fn validate_enqueue(userid: &str, source_ref: &str, question: &str) -> Result<(), CoreError> {
    if userid.trim().is_empty() {
        return Err(CoreError::Validation("userid must not be empty".into()));
    }
    if source_ref.trim().is_empty() {
        return Err(CoreError::Validation(
            "source_ref must not be empty".into(),
        ));
    }
    if source_ref.len() > MAX_SOURCE_REF_LEN {
        return Err(CoreError::Validation(format!(
            "source_ref exceeds {MAX_SOURCE_REF_LEN} characters"
        )));
    }
    if question.trim().is_empty() {
        return Err(CoreError::Validation("question must not be empty".into()));
    }
    if question.len() > MAX_QUESTION_LEN {
        return Err(CoreError::Validation(format!(
            "question exceeds {MAX_QUESTION_LEN} characters"
        )));
    }
    Ok(())
}
