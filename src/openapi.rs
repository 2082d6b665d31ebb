#![allow(clippy::needless_for_each)]

use crate::analytics::interval::Interval;
use crate::analytics::types::{ChartData, ChartDataset, GraphDataResponse, GraphLogs, LogsResponse};
use crate::error::ErrorResponse;
use crate::hello::HelloResponse;
use crate::types::{CountMetric, GraphBucket, HealthResponse, LogEntry, LogStatus};

/// Path of the generated OpenAPI document.
pub const OPENAPI_JSON_PATH: &str = "/api-doc/openapi.json";
/// Mount point of the Swagger UI.
pub const SWAGGER_UI_PATH: &str = "/api-docs";

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "apilog API",
        version = "0.1.0",
        description = "Logged demo endpoint plus analytics over the call log: paginated logs, totals and time-bucketed graph data.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Demo", description = "Tracked demo endpoint"),
        (name = "Analytics", description = "Queries over the API call log")
    ),
    paths(
        crate::health::health,
        crate::hello::hello_world,
        crate::analytics::handler::list_logs,
        crate::analytics::handler::counts,
        crate::analytics::handler::graph_data,
    ),
    components(schemas(
        HealthResponse, HelloResponse, ErrorResponse,
        LogEntry, LogStatus, LogsResponse,
        CountMetric,
        GraphBucket, GraphLogs, GraphDataResponse, Interval,
        ChartData, ChartDataset,
    ))
)]
pub struct ApiDoc;
