use crate::recorder::LogRecorder;
use crate::types::HealthResponse;
use axum::extract::State;
use axum::Json;
use deadpool_sqlite::Pool;
use std::sync::Arc;

pub struct HealthState {
    pub pool: Pool,
    pub recorder: LogRecorder,
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service status, DB reachability and write buffer usage", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    let db_ok = match state.pool.get().await {
        Ok(conn) => conn
            .interact(|conn| conn.execute_batch("SELECT 1"))
            .await
            .is_ok_and(|r| r.is_ok()),
        Err(_) => false,
    };

    Json(HealthResponse {
        status: if db_ok {
            "ok".into()
        } else {
            "degraded".into()
        },
        db_ok,
        buffer_usage: state.recorder.buffer_usage(),
    })
}
