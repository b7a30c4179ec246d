//! Review engine: turns a submission into a structured [`Evaluation`].
//!
//! The shipped implementation calls an LLM text-generation endpoint
//! (Gemini-style `generateContent` API) with a grading prompt built from
//! the question, the rubric, and the submission. The model's reply is
//! decoded exactly once, here; downstream code only ever sees a typed
//! [`Evaluation`] or a [`ReviewError`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use codegrade_core::evaluation::Evaluation;
use codegrade_core::rubric::Rubric;

use crate::error::ReviewError;

/// Default timeout for one review call. Model calls are slow.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How much raw model output to keep in an `Unparsable` error.
const RAW_SAMPLE_LEN: usize = 1000;

/// Produces a structured evaluation for a submission.
#[async_trait]
pub trait ReviewEngine: Send + Sync {
    async fn review(
        &self,
        content: &str,
        question: &str,
        rubric: &Rubric,
    ) -> Result<Evaluation, ReviewError>;
}

/// Review engine backed by an LLM generation endpoint.
pub struct LlmReviewEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl LlmReviewEngine {
    /// `endpoint` is the full `generateContent` URL for the chosen model.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ReviewEngine for LlmReviewEngine {
    async fn review(
        &self,
        content: &str,
        question: &str,
        rubric: &Rubric,
    ) -> Result<Evaluation, ReviewError> {
        let prompt = build_prompt(content, question, rubric)?;

        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReviewError::Status(status.as_u16()));
        }

        let reply: GenerateReply = response.json().await?;
        let text = reply.first_text().ok_or_else(|| ReviewError::Unparsable {
            reason: "response contained no candidate text".into(),
            raw: String::new(),
        })?;

        decode_evaluation(text)
    }
}

/// Build the grading prompt sent to the model.
fn build_prompt(content: &str, question: &str, rubric: &Rubric) -> Result<String, ReviewError> {
    let rubric_json = serde_json::to_string_pretty(&rubric.criteria)?;

    Ok(format!(
        r#"You are an expert programming instructor and automatic grader.

### Task
Grade the following student's code using this rubric and the weightings set for each criterion:
{rubric_json}

**Question:**
{question}

**Instructions:**
- Apply each criterion fairly.
- You may simulate test cases mentally; do not run code.
- Be concise and constructive.

Respond **only** in this JSON format:

{{
    "criteria_results": [
        {{
            "criteria": "<criteriondescription>",
            "criterionid": "<criterionid>",
            "remark": "<remarks>",
            "levelid": "<levelid>"
        }}
    ],
    "feedback_comment": "<overall-feedback-comment>"
}}

**Student Code:**
{content}
"#
    ))
}

/// Strip a surrounding markdown code fence, if present.
///
/// Models routinely wrap JSON replies in ```json fences despite being
/// told not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    match rest.rfind("```") {
        Some(idx) => rest[..idx].trim(),
        None => rest.trim(),
    }
}

/// Decode model output into an [`Evaluation`], once.
fn decode_evaluation(text: &str) -> Result<Evaluation, ReviewError> {
    let cleaned = strip_code_fence(text);
    serde_json::from_str::<Evaluation>(cleaned).map_err(|e| ReviewError::Unparsable {
        reason: e.to_string(),
        raw: cleaned.chars().take(RAW_SAMPLE_LEN).collect(),
    })
}

/// Minimal view of a `generateContent` response.
#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateReply {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .filter(|t| !t.is_empty())
    }
}
