use crate::error::AppError;
use crate::types::TimeRange;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

const MISSING_RANGE: &str = "Both fromTimestamp and toTimestamp are required.";
const INVALID_RANGE: &str = "Invalid time range.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeParams {
    from_timestamp: Option<String>,
    to_timestamp: Option<String>,
}

/// Epoch milliseconds as an integer or as an integral float (`1e12`,
/// `1696917600000.0`).
fn parse_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let ms = match raw.parse::<i64>() {
        Ok(ms) => ms,
        Err(_) => {
            let f: f64 = raw.parse().ok()?;
            if !f.is_finite() || f.fract() != 0.0 || f.abs() >= i64::MAX as f64 {
                return None;
            }
            f as i64
        }
    };
    chrono::DateTime::from_timestamp_millis(ms).map(|_| ms)
}

/// Validate the raw `fromTimestamp` / `toTimestamp` query values (epoch ms).
pub fn validate_range(from: Option<&str>, to: Option<&str>) -> Result<TimeRange, AppError> {
    let (Some(from), Some(to)) = (
        from.filter(|s| !s.trim().is_empty()),
        to.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::Validation(MISSING_RANGE.to_string()));
    };

    parse_millis(from)
        .zip(parse_millis(to))
        .and_then(|(from, to)| TimeRange::new(from, to))
        .ok_or_else(|| AppError::Validation(INVALID_RANGE.to_string()))
}

impl<S> FromRequestParts<S> for TimeRange
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<RangeParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        validate_range(params.from_timestamp.as_deref(), params.to_timestamp.as_deref()).inspect_err(
            |e| {
                tracing::debug!(path = %parts.uri.path(), error = %e, "rejected time range");
            },
        )
    }
}
