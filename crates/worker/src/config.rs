use std::time::Duration;

use codegrade_dispatch::SweepConfig;

/// Worker process configuration loaded from environment variables.
///
/// All tunables have defaults suitable for local development; collaborator
/// endpoints must be provided.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent worker loops (default: `2`).
    pub worker_count: usize,
    /// How long a loop waits on the dispatch channel before falling back
    /// to polling the queue directly (default: `5` seconds).
    pub idle_timeout: Duration,
    /// Sweep tunables.
    pub sweep: SweepConfig,
    /// Per-fetch timeout for the source fetcher (default: `30` seconds).
    pub fetch_timeout: Duration,
    /// Full `generateContent`-style URL of the review model endpoint.
    pub review_api_url: String,
    /// API key for the review endpoint.
    pub review_api_key: String,
    /// Moodle webservice endpoint (`.../webservice/rest/server.php`).
    pub moodle_api_url: String,
    /// Moodle webservice token.
    pub moodle_api_token: String,
    /// Optional status-report sink; notifications are skipped when unset.
    pub status_report_url: Option<String>,
    /// API key for the status-report sink.
    pub status_report_key: String,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default      |
    /// |------------------------|--------------|
    /// | `WORKER_COUNT`         | `2`          |
    /// | `IDLE_TIMEOUT_SECS`    | `5`          |
    /// | `SWEEP_INTERVAL_SECS`  | `30`         |
    /// | `STUCK_TIMEOUT_SECS`   | `600`        |
    /// | `MISSED_TIMEOUT_SECS`  | `60`         |
    /// | `FETCH_TIMEOUT_SECS`   | `30`         |
    /// | `REVIEW_API_URL`       | *(required)* |
    /// | `REVIEW_API_KEY`       | *(required)* |
    /// | `MOODLE_API_URL`       | *(required)* |
    /// | `MOODLE_API_TOKEN`     | *(required)* |
    /// | `STATUS_REPORT_URL`    | *(unset)*    |
    /// | `STATUS_REPORT_KEY`    | *(empty)*    |
    pub fn from_env() -> Self {
        let worker_count: usize = env_or("WORKER_COUNT", "2")
            .parse()
            .expect("WORKER_COUNT must be a valid usize");

        let idle_timeout = secs_env("IDLE_TIMEOUT_SECS", "5");

        let sweep = SweepConfig {
            interval: secs_env("SWEEP_INTERVAL_SECS", "30"),
            stuck_timeout: secs_env("STUCK_TIMEOUT_SECS", "600"),
            missed_timeout: secs_env("MISSED_TIMEOUT_SECS", "60"),
        };

        Self {
            worker_count,
            idle_timeout,
            sweep,
            fetch_timeout: secs_env("FETCH_TIMEOUT_SECS", "30"),
            review_api_url: required_env("REVIEW_API_URL"),
            review_api_key: required_env("REVIEW_API_KEY"),
            moodle_api_url: required_env("MOODLE_API_URL"),
            moodle_api_token: required_env("MOODLE_API_TOKEN"),
            status_report_url: std::env::var("STATUS_REPORT_URL").ok(),
            status_report_key: std::env::var("STATUS_REPORT_KEY").unwrap_or_default(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("{key} must be set"))
}

fn secs_env(key: &str, default: &str) -> Duration {
    let secs: u64 = env_or(key, default)
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid u64"));
    Duration::from_secs(secs)
}
