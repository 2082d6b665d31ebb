use crate::error::ErrorResponse;
use crate::recorder::{snapshot_request, LogRecorder};
use crate::types::NewLogEntry;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

const HELLO_MESSAGE: &str = "Hello, World!";
const FAILURE_BODY: &str = "Internal Server Error";
const FAILURE_REASON: &str = "Random failure occurred.";

pub struct HelloState {
    pub recorder: LogRecorder,
    /// Probability of a simulated failure, in `[0, 1]`.
    pub failure_rate: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HelloResponse {
    #[schema(example = "Hello, World!")]
    pub message: String,
}

/// GET /api/helloWorld - Demo endpoint whose every call is logged.
#[utoipa::path(
    get,
    path = "/api/helloWorld",
    tag = "Demo",
    summary = "Logged hello world",
    description = "Returns a greeting. Every call is recorded in the API log, and a configurable share of calls fails on purpose.",
    params(
        ("userId" = String, Query, description = "Caller identifier")
    ),
    responses(
        (status = 200, description = "Greeting", body = HelloResponse),
        (status = 400, description = "userId missing", body = ErrorResponse),
        (status = 500, description = "Simulated failure", body = ErrorResponse)
    )
)]
pub async fn hello_world(
    State(state): State<Arc<HelloState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(user_id) = query.get("userId").filter(|id| !id.is_empty()).cloned() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("User ID is required.")),
        )
            .into_response();
    };

    let failed = state.failure_rate > 0.0 && rand::thread_rng().gen_bool(state.failure_rate);
    let request = snapshot_request(&headers, &query, None);
    let now_ms = chrono::Utc::now().timestamp_millis();

    if failed {
        state.recorder.record(NewLogEntry::failure(
            user_id,
            now_ms,
            request,
            Some(json!({ "status": 500, "error": FAILURE_BODY })),
            FAILURE_REASON,
        ));
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(FAILURE_BODY)),
        )
            .into_response();
    }

    state.recorder.record(NewLogEntry::success(
        user_id,
        now_ms,
        request,
        json!({ "status": 200, "message": HELLO_MESSAGE }),
    ));
    let body = HelloResponse {
        message: HELLO_MESSAGE.to_string(),
    };
    (StatusCode::OK, Json(body)).into_response()
}
