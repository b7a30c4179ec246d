//! Liveness probe, mounted at the root (outside `/api/v1`).

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Probe payload. `status` is `"degraded"` when the store is unreachable
/// but the process itself is up; orchestrators treat both as alive.
#[derive(Serialize)]
struct Health {
    status: &'static str,
    db_healthy: bool,
    version: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let db_healthy = codegrade_db::health_check(&state.pool).await.is_ok();
    Json(Health {
        status: if db_healthy { "ok" } else { "degraded" },
        db_healthy,
        version: env!("CARGO_PKG_VERSION"),
    })
}
