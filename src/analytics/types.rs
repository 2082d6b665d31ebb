use crate::analytics::interval::Interval;
use crate::types::{GraphBucket, LogEntry};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Extra query parameters for `GET /api/analytics/logs`. The time range is
/// extracted separately.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQueryParams {
    /// JSON object, e.g. `{"status":"Failure"}`.
    pub filter: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    #[default]
    Series,
    Chart,
}

#[derive(Debug, Deserialize)]
pub struct GraphQueryParams {
    pub format: Option<GraphFormat>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

/// Bucket series, or its line-chart projection with `format=chart`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum GraphLogs {
    Series(Vec<GraphBucket>),
    Chart(ChartData),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GraphDataResponse {
    pub logs: GraphLogs,
    pub interval: Interval,
}

// ── Chart projection ──

const CHART_COLOR: &str = "rgb(75, 192, 192)";
const CHART_TENSION: f64 = 0.1;

#[derive(Debug, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    #[schema(value_type = String, example = "Users")]
    pub label: &'static str,
    pub data: Vec<i64>,
    pub fill: bool,
    #[schema(value_type = String, example = "rgb(75, 192, 192)")]
    pub border_color: &'static str,
    pub tension: f64,
}

impl ChartDataset {
    fn line(label: &'static str, data: Vec<i64>) -> Self {
        Self {
            label,
            data,
            fill: false,
            border_color: CHART_COLOR,
            tension: CHART_TENSION,
        }
    }
}

/// Line-chart shaped view of a bucket series: one label per bucket and one
/// dataset each for users, successful calls and failed calls.
#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl ChartData {
    pub fn from_buckets(buckets: &[GraphBucket]) -> Self {
        let labels = buckets.iter().map(|b| b.bucket.clone()).collect();
        let users = buckets.iter().map(|b| b.unique_users).collect();
        let success = buckets.iter().map(|b| b.success).collect();
        let failure = buckets.iter().map(|b| b.failure).collect();

        Self {
            labels,
            datasets: vec![
                ChartDataset::line("Users", users),
                ChartDataset::line("Successful API Calls", success),
                ChartDataset::line("Failure API Calls", failure),
            ],
        }
    }
}
