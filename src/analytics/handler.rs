use crate::analytics::interval::Interval;
use crate::analytics::types::*;
use crate::analytics::AnalyticsState;
use crate::error::{AppError, AppResult, ErrorResponse, LoggedQuery};
use crate::storage::reader;
use crate::types::{CountMetric, LogFilter, Page, TimeRange};
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// GET /api/analytics/logs
#[utoipa::path(
    get,
    path = "/api/analytics/logs",
    tag = "Analytics",
    summary = "List logged calls",
    description = "One page of log entries in the time range, oldest first.",
    params(
        ("fromTimestamp" = i64, Query, description = "Range start, epoch milliseconds (inclusive)"),
        ("toTimestamp" = i64, Query, description = "Range end, epoch milliseconds (inclusive)"),
        ("filter" = Option<String>, Query, description = "JSON object, e.g. {\"status\":\"Failure\"}"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Entries per page")
    ),
    responses(
        (status = 200, description = "Page of log entries", body = LogsResponse),
        (status = 400, description = "Invalid range or filter", body = ErrorResponse)
    )
)]
pub async fn list_logs(
    State(state): State<Arc<AnalyticsState>>,
    range: TimeRange,
    LoggedQuery(qp): LoggedQuery<LogsQueryParams>,
) -> AppResult<Json<LogsResponse>> {
    let filter = LogFilter::parse(qp.filter.as_deref()).map_err(AppError::Validation)?;
    let page = Page::new(
        qp.page,
        qp.page_size,
        state.query.default_page_size,
        state.query.max_page_size,
    );

    let logs = reader::list_logs(&state.pool, range, filter, page).await?;
    Ok(Json(LogsResponse { logs }))
}

/// GET /api/analytics/counts
#[utoipa::path(
    get,
    path = "/api/analytics/counts",
    tag = "Analytics",
    summary = "Call totals",
    description = "Distinct users, total calls and failed calls in the time range.",
    params(
        ("fromTimestamp" = i64, Query, description = "Range start, epoch milliseconds (inclusive)"),
        ("toTimestamp" = i64, Query, description = "Range end, epoch milliseconds (inclusive)"),
    ),
    responses(
        (status = 200, description = "Named totals", body = [CountMetric]),
        (status = 400, description = "Invalid range", body = ErrorResponse)
    )
)]
pub async fn counts(
    State(state): State<Arc<AnalyticsState>>,
    range: TimeRange,
) -> AppResult<Json<Vec<CountMetric>>> {
    let counts = reader::range_counts(&state.pool, range).await?;

    Ok(Json(vec![
        CountMetric {
            name: "Users",
            value: counts.unique_users,
        },
        CountMetric {
            name: "Total API calls",
            value: counts.total_calls,
        },
        CountMetric {
            name: "Failed API calls",
            value: counts.failed_calls,
        },
    ]))
}

/// GET /api/analytics/graphData
#[utoipa::path(
    get,
    path = "/api/analytics/graphData",
    tag = "Analytics",
    summary = "Time-bucketed call statistics",
    description = "Buckets sized by range length: minute up to 10 minutes, 5 minutes up to an hour, hour up to a day, day beyond. Ranges that have already ended are served from cache.",
    params(
        ("fromTimestamp" = i64, Query, description = "Range start, epoch milliseconds (inclusive)"),
        ("toTimestamp" = i64, Query, description = "Range end, epoch milliseconds (inclusive)"),
        ("format" = Option<String>, Query, description = "`series` (default) or `chart`")
    ),
    responses(
        (status = 200, description = "Bucket series and the interval used", body = GraphDataResponse),
        (status = 400, description = "Invalid range", body = ErrorResponse)
    )
)]
pub async fn graph_data(
    State(state): State<Arc<AnalyticsState>>,
    range: TimeRange,
    LoggedQuery(qp): LoggedQuery<GraphQueryParams>,
) -> AppResult<Json<GraphDataResponse>> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let buckets = state
        .cache
        .get_or_compute(range, now_ms, || {
            reader::aggregate_buckets(&state.pool, range)
        })
        .await?;

    let logs = match qp.format.unwrap_or_default() {
        GraphFormat::Series => GraphLogs::Series(buckets),
        GraphFormat::Chart => GraphLogs::Chart(ChartData::from_buckets(&buckets)),
    };

    Ok(Json(GraphDataResponse {
        logs,
        interval: Interval::for_duration(range.duration_ms()),
    }))
}
