//! Optional status notifier: best-effort reporting of job outcomes to an
//! external dashboard sink. Failures are logged by the runner and never
//! affect the job.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use codegrade_db::models::job::GradingJob;

use crate::error::NotifyError;

/// Default timeout for one notify call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Best-effort sink for job status summaries.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    async fn notify(&self, job: &GradingJob, outcome: &str, details: &str)
        -> Result<(), NotifyError>;
}

/// Posts status rows to a REST endpoint (Supabase-style table insert).
pub struct HttpStatusNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpStatusNotifier {
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
impl StatusNotifier for HttpStatusNotifier {
    async fn notify(
        &self,
        job: &GradingJob,
        outcome: &str,
        details: &str,
    ) -> Result<(), NotifyError> {
        let body = json!({
            "job_id": job.id,
            "userid": job.userid,
            "assignment_id": job.assignment_id,
            "assignment_name": job.assignment_name,
            "autograde_status": outcome,
            "details": details,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}
