//! The grading pipeline: external collaborators and the job runner.
//!
//! Each external capability sits behind a trait so the runner can be
//! exercised with in-memory doubles and so alternative backends plug in
//! without touching the lifecycle logic. The shipped implementations talk
//! HTTP: raw source fetch, an LLM review endpoint, the Moodle grading
//! webservice, and an optional status-report sink.

pub mod error;
pub mod fetcher;
pub mod notifier;
pub mod reporter;
pub mod review;
pub mod runner;

pub use error::{FetchError, NotifyError, ReportError, ReviewError};
pub use fetcher::{HttpSourceFetcher, SourceFetcher};
pub use notifier::{HttpStatusNotifier, StatusNotifier};
pub use reporter::{GradeReporter, MoodleReporter};
pub use review::{LlmReviewEngine, ReviewEngine};
pub use runner::JobRunner;
