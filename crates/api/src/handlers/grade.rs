//! Handlers for the `/grade` resource: enqueue a grading job and query
//! its status.
//!
//! The request body keeps the grading platform's webhook field names
//! (`onlinetext`, `assignmentactivity`, ...) so existing submission
//! plumbing posts here unchanged.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use codegrade_core::types::DbId;
use codegrade_core::CoreError;
use codegrade_db::models::job::EnqueueJob;
use codegrade_db::models::status::JobStatus;
use codegrade_db::repositories::JobRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Incoming grading request, in the platform's webhook vocabulary.
#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    #[validate(length(min = 1, message = "userid must not be empty"))]
    pub userid: String,
    /// Submission locator (URL of the submitted artifact).
    #[validate(length(min = 1, message = "onlinetext must not be empty"))]
    pub onlinetext: String,
    /// Grading prompt / activity instruction.
    #[validate(length(min = 1, message = "assignmentactivity must not be empty"))]
    pub assignmentactivity: String,
    pub assignmentid: String,
    #[serde(default)]
    pub assignmentname: String,
    #[serde(default)]
    pub assignmentintro: String,
    /// Opaque rubric payload; absent means no criteria.
    #[serde(default)]
    pub assignmentrubric: Option<serde_json::Value>,
}

/// Response for a freshly enqueued job.
#[derive(Debug, Serialize)]
pub struct EnqueuedResponse {
    pub job_id: DbId,
    pub status: JobStatus,
}

/// Status view of a single job.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    pub result: Option<serde_json::Value>,
}

/// Query parameters for the job listing.
#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
}

/// POST /api/v1/grade
///
/// Validate and enqueue a grading job. Returns 201 with the new job id;
/// the job is picked up asynchronously by the worker fleet.
pub async fn submit_grade(
    State(state): State<AppState>,
    Json(input): Json<GradeRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let enqueue = EnqueueJob {
        userid: input.userid,
        source_ref: input.onlinetext,
        question: input.assignmentactivity,
        rubric: input.assignmentrubric,
        assignment_id: input.assignmentid,
        assignment_name: input.assignmentname,
        assignment_intro: input.assignmentintro,
    };

    let job = JobRepo::enqueue(&state.pool, &enqueue).await?;

    tracing::info!(job_id = job.id, userid = %job.userid, "Grading job enqueued");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: EnqueuedResponse {
                job_id: job.id,
                status: job.status,
            },
        }),
    ))
}

/// GET /api/v1/grade/{id}/status
///
/// Current status plus, on terminal states, the structured result.
pub async fn grade_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Grading job",
            id,
        }))?;

    Ok(Json(DataResponse {
        data: JobStatusResponse {
            status: job.status,
            result: job.result,
        },
    }))
}

/// GET /api/v1/jobs
///
/// List recent jobs, newest first, for status dashboards.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = JobRepo::list_all(&state.pool, params.limit).await?;
    Ok(Json(DataResponse { data: jobs }))
}
