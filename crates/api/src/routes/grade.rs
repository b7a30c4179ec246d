//! Route definitions for the grading resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::grade;
use crate::state::AppState;

/// Routes mounted at `/api/v1`.
///
/// ```text
/// POST   /grade               -> submit_grade
/// GET    /grade/{id}/status   -> grade_status
/// GET    /jobs                -> list_jobs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/grade", post(grade::submit_grade))
        .route("/grade/{id}/status", get(grade::grade_status))
        .route("/jobs", get(grade::list_jobs))
}
