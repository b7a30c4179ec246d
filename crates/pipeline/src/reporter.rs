//! Grade reporter: delivers an evaluation to the grading platform.
//!
//! The shipped implementation targets Moodle's `mod_assign_save_grade`
//! webservice function, encoding the per-criterion rubric fillings as the
//! indexed `advancedgradingdata[rubric][criteria][..]` form parameters the
//! API expects.

use std::time::Duration;

use async_trait::async_trait;

use codegrade_core::evaluation::Evaluation;

use crate::error::ReportError;

/// Default timeout for one report call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers a finished evaluation to the originating platform.
#[async_trait]
pub trait GradeReporter: Send + Sync {
    /// Returns the platform's response body on success.
    async fn report(
        &self,
        assignment_id: &str,
        userid: &str,
        evaluation: &Evaluation,
    ) -> Result<serde_json::Value, ReportError>;
}

/// Reporter for the Moodle assignment webservice.
pub struct MoodleReporter {
    client: reqwest::Client,
    /// Webservice endpoint, e.g. `https://moodle/webservice/rest/server.php`.
    endpoint: String,
    token: String,
}

impl MoodleReporter {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl GradeReporter for MoodleReporter {
    async fn report(
        &self,
        assignment_id: &str,
        userid: &str,
        evaluation: &Evaluation,
    ) -> Result<serde_json::Value, ReportError> {
        let params = save_grade_params(&self.token, assignment_id, userid, evaluation);

        let response = self.client.post(&self.endpoint).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status(status.as_u16()));
        }

        // Moodle replies with JSON (`null` on plain success).
        Ok(response
            .json::<serde_json::Value>()
            .await
            .unwrap_or(serde_json::Value::Null))
    }
}

/// Build the `mod_assign_save_grade` form parameters.
///
/// Key layout matches the Moodle REST array-encoding convention; each
/// criterion contributes one `criterionid` entry plus its filling's
/// criterionid/levelid/remark.
fn save_grade_params(
    token: &str,
    assignment_id: &str,
    userid: &str,
    evaluation: &Evaluation,
) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
        ("wstoken".into(), token.into()),
        ("wsfunction".into(), "mod_assign_save_grade".into()),
        ("moodlewsrestformat".into(), "json".into()),
        ("assignmentid".into(), assignment_id.into()),
        ("userid".into(), userid.into()),
        ("grade".into(), "100".into()),
        ("attemptnumber".into(), "-1".into()),
        ("addattempt".into(), "0".into()),
        ("workflowstate".into(), "graded".into()),
        ("applytoall".into(), "0".into()),
        (
            "plugindata[assignfeedbackcomments_editor][text]".into(),
            evaluation.comment.clone(),
        ),
        (
            "plugindata[assignfeedbackcomments_editor][format]".into(),
            "1".into(),
        ),
    ];

    for (i, entry) in evaluation.entries.iter().enumerate() {
        params.push((
            format!("advancedgradingdata[rubric][criteria][{i}][criterionid]"),
            entry.criterionid.clone(),
        ));
        params.push((
            format!("advancedgradingdata[rubric][criteria][{i}][fillings][{i}][criterionid]"),
            entry.criterionid.clone(),
        ));
        params.push((
            format!("advancedgradingdata[rubric][criteria][{i}][fillings][{i}][levelid]"),
            entry.levelid.clone(),
        ));
        params.push((
            format!("advancedgradingdata[rubric][criteria][{i}][fillings][{i}][remark]"),
            entry.remark.clone(),
        ));
    }

    params
}
