//! Integration tests for the grading job store: enqueue, claims,
//! terminal transitions, and sweep queries.

use assert_matches::assert_matches;
use sqlx::PgPool;

use codegrade_db::models::job::EnqueueJob;
use codegrade_db::models::status::JobStatus;
use codegrade_db::repositories::job_repo::{EnqueueError, DISPATCH_CHANNEL};
use codegrade_db::repositories::JobRepo;

fn sample_job() -> EnqueueJob {
    EnqueueJob {
        userid: "2".into(),
        source_ref: "https://example/ok.py".into(),
        question: "sum two numbers".into(),
        rubric: Some(serde_json::json!({
            "criteria": [
                {"criterionid": "1", "criterion": "Correctness", "levels": []},
                {"criterionid": "2", "criterion": "Logic", "levels": []}
            ]
        })),
        assignment_id: "1".into(),
        assignment_name: "Coding Project".into(),
        assignment_intro: "Project introduction".into(),
    }
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn enqueue_creates_queued_job_with_null_result(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();

    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.result.is_none());

    let fetched = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(fetched.source_ref, "https://example/ok.py");
    assert_eq!(fetched.question, "sum two numbers");
}

#[sqlx::test(migrations = "./migrations")]
async fn enqueue_defaults_missing_rubric_to_empty_object(pool: PgPool) {
    let mut input = sample_job();
    input.rubric = None;

    let job = JobRepo::enqueue(&pool, &input).await.unwrap();
    assert_eq!(job.rubric, serde_json::json!({}));
}

#[sqlx::test(migrations = "./migrations")]
async fn enqueue_rejects_blank_required_fields(pool: PgPool) {
    let mut input = sample_job();
    input.source_ref = "   ".into();

    let err = JobRepo::enqueue(&pool, &input).await.unwrap_err();
    assert_matches!(err, EnqueueError::Validation(_));

    // Nothing was inserted.
    assert!(JobRepo::next_queued(&pool).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn enqueue_emits_dispatch_signal_with_job_id(pool: PgPool) {
    let mut listener = sqlx::postgres::PgListener::connect_with(&pool)
        .await
        .unwrap();
    listener.listen(DISPATCH_CHANNEL).await.unwrap();

    let job = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();

    let notification = listener.recv().await.unwrap();
    assert_eq!(notification.payload(), job.id.to_string());
}

// ---------------------------------------------------------------------------
// Claim protocol
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn claim_succeeds_exactly_once(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();

    let first = JobRepo::transition(&pool, job.id, JobStatus::Queued, JobStatus::InProgress, None)
        .await
        .unwrap();
    let second = JobRepo::transition(&pool, job.id, JobStatus::Queued, JobStatus::InProgress, None)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_claims_have_a_single_winner(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let id = job.id;
        handles.push(tokio::spawn(async move {
            JobRepo::transition(&pool, id, JobStatus::Queued, JobStatus::InProgress, None)
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn claim_on_done_job_is_a_noop(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();

    assert!(
        JobRepo::transition(&pool, job.id, JobStatus::Queued, JobStatus::InProgress, None)
            .await
            .unwrap()
    );
    let result = serde_json::json!({"evaluation": {"criteria_results": []}, "report": {"ok": true}});
    assert!(JobRepo::transition(
        &pool,
        job.id,
        JobStatus::InProgress,
        JobStatus::Done,
        Some(&result)
    )
    .await
    .unwrap());

    // A duplicate dispatch signal for a finished job claims nothing.
    let claimed =
        JobRepo::transition(&pool, job.id, JobStatus::Queued, JobStatus::InProgress, None)
            .await
            .unwrap();
    assert!(!claimed);

    let fetched = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, JobStatus::Done);
    assert_eq!(fetched.result, Some(result));
}

// ---------------------------------------------------------------------------
// Result invariant
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn result_is_null_iff_job_is_not_terminal(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();
    assert!(job.result.is_none());

    JobRepo::transition(&pool, job.id, JobStatus::Queued, JobStatus::InProgress, None)
        .await
        .unwrap();
    let in_progress = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert!(in_progress.result.is_none());

    let failure = serde_json::json!({"error": {"stage": "fetch", "message": "boom"}});
    JobRepo::transition(
        &pool,
        job.id,
        JobStatus::InProgress,
        JobStatus::Failed,
        Some(&failure),
    )
    .await
    .unwrap();
    let failed = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.result.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn terminal_transition_without_result_violates_schema(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();
    JobRepo::transition(&pool, job.id, JobStatus::Queued, JobStatus::InProgress, None)
        .await
        .unwrap();

    // The check constraint refuses a terminal row with a NULL result.
    let err = JobRepo::transition(&pool, job.id, JobStatus::InProgress, JobStatus::Done, None)
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(_));
}

// ---------------------------------------------------------------------------
// Sweep queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn stalled_finds_old_in_progress_rows(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();
    JobRepo::transition(&pool, job.id, JobStatus::Queued, JobStatus::InProgress, None)
        .await
        .unwrap();

    let future_cutoff = chrono::Utc::now() + chrono::Duration::hours(1);
    let stalled = JobRepo::stalled(&pool, JobStatus::InProgress, future_cutoff)
        .await
        .unwrap();
    assert_eq!(stalled, vec![job.id]);

    let past_cutoff = chrono::Utc::now() - chrono::Duration::hours(1);
    let stalled = JobRepo::stalled(&pool, JobStatus::InProgress, past_cutoff)
        .await
        .unwrap();
    assert!(stalled.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn reclaimed_job_can_be_claimed_again(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();
    JobRepo::transition(&pool, job.id, JobStatus::Queued, JobStatus::InProgress, None)
        .await
        .unwrap();

    // Sweep reclaim path.
    let reclaimed =
        JobRepo::transition(&pool, job.id, JobStatus::InProgress, JobStatus::Queued, None)
            .await
            .unwrap();
    assert!(reclaimed);

    let claimed =
        JobRepo::transition(&pool, job.id, JobStatus::Queued, JobStatus::InProgress, None)
            .await
            .unwrap();
    assert!(claimed);
}

#[sqlx::test(migrations = "./migrations")]
async fn next_queued_returns_oldest_first(pool: PgPool) {
    let first = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();
    let _second = JobRepo::enqueue(&pool, &sample_job()).await.unwrap();

    let next = JobRepo::next_queued(&pool).await.unwrap();
    assert_eq!(next, Some(first.id));

    JobRepo::transition(&pool, first.id, JobStatus::Queued, JobStatus::InProgress, None)
        .await
        .unwrap();
    let next = JobRepo::next_queued(&pool).await.unwrap();
    assert_ne!(next, Some(first.id));
}
