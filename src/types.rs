use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Outcome of a tracked API call.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
pub enum LogStatus {
    Success,
    Failure,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "Success",
            LogStatus::Failure => "Failure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Success" => Some(LogStatus::Success),
            "Failure" => Some(LogStatus::Failure),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the inbound request as it was received.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RequestSnapshot {
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

/// A log entry waiting to be persisted. The timestamp is fixed at construction.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub user_id: String,
    pub timestamp: i64,
    pub status: LogStatus,
    pub error: Option<String>,
    pub request: RequestSnapshot,
    pub response: Option<serde_json::Value>,
}

impl NewLogEntry {
    pub fn success(
        user_id: impl Into<String>,
        timestamp: i64,
        request: RequestSnapshot,
        response: serde_json::Value,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            status: LogStatus::Success,
            error: None,
            request,
            response: Some(response),
        }
    }

    pub fn failure(
        user_id: impl Into<String>,
        timestamp: i64,
        request: RequestSnapshot,
        response: Option<serde_json::Value>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            status: LogStatus::Failure,
            error: Some(error.into()),
            request,
            response,
        }
    }
}

/// Persisted log entry returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    #[schema(example = "abc")]
    pub user_id: String,
    /// Epoch milliseconds.
    #[schema(example = 1696917600000_i64)]
    pub timestamp: i64,
    pub status: LogStatus,
    /// Set only on failures.
    pub error: Option<String>,
    /// Request snapshot: headers, query and body.
    #[schema(value_type = Option<Object>)]
    pub request: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub response: Option<serde_json::Value>,
}

/// Per-bucket statistics for graph data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraphBucket {
    /// UTC bucket label, e.g. `2023-10-10 06:00`.
    #[schema(example = "2023-10-10 06:00")]
    pub bucket: String,
    pub total: i64,
    pub success: i64,
    pub failure: i64,
    pub unique_users: i64,
}

/// One named metric in the counts response.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct CountMetric {
    #[schema(value_type = String, example = "Total API calls")]
    pub name: &'static str,
    pub value: i64,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub db_ok: bool,
    pub buffer_usage: f64,
}

/// Inclusive `[from, to]` range in epoch milliseconds, validated so that
/// `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    from: i64,
    to: i64,
}

impl TimeRange {
    pub fn new(from: i64, to: i64) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    pub fn from(&self) -> i64 {
        self.from
    }

    pub fn to(&self) -> i64 {
        self.to
    }

    pub fn duration_ms(&self) -> i64 {
        self.to - self.from
    }

    /// A range is closed once its end is strictly in the past; no new entries
    /// can land in it after that.
    pub fn is_closed_at(&self, now_ms: i64) -> bool {
        self.to < now_ms
    }
}

/// Recognized fields of the `filter` JSON parameter on the log listing.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogFilter {
    pub status: Option<LogStatus>,
}

impl LogFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(raw) => serde_json::from_str(raw).map_err(|e| format!("invalid filter: {e}")),
        }
    }
}

/// 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn new(page: Option<u32>, page_size: Option<u32>, default_size: u32, max_size: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_size).clamp(1, max_size.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}
