use serde::Serialize;
use utoipa::ToSchema;

const TEN_MINUTES_MS: i64 = 10 * 60_000;
const ONE_HOUR_MS: i64 = 3_600_000;
const ONE_DAY_MS: i64 = 86_400_000;

/// Bucket granularity for graph data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Interval {
    #[serde(rename = "minute")]
    Minute,
    #[serde(rename = "5_minutes")]
    FiveMinutes,
    #[serde(rename = "hour")]
    Hour,
    #[serde(rename = "day")]
    Day,
}

impl Interval {
    /// Pick the bucket size for a range of `duration_ms`. Each threshold is
    /// inclusive, so a duration exactly on a boundary gets the finer bucket.
    pub fn for_duration(duration_ms: i64) -> Self {
        if duration_ms <= TEN_MINUTES_MS {
            Interval::Minute
        } else if duration_ms <= ONE_HOUR_MS {
            Interval::FiveMinutes
        } else if duration_ms <= ONE_DAY_MS {
            Interval::Hour
        } else {
            Interval::Day
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute => "minute",
            Interval::FiveMinutes => "5_minutes",
            Interval::Hour => "hour",
            Interval::Day => "day",
        }
    }

    pub fn width_ms(&self) -> i64 {
        match self {
            Interval::Minute => 60_000,
            Interval::FiveMinutes => 300_000,
            Interval::Hour => ONE_HOUR_MS,
            Interval::Day => ONE_DAY_MS,
        }
    }

    /// strftime pattern for the bucket label. Every pattern is fixed-width, so
    /// labels sort chronologically as plain strings.
    pub fn label_format(&self) -> &'static str {
        match self {
            Interval::Minute | Interval::FiveMinutes => "%Y-%m-%d %H:%M",
            Interval::Hour => "%Y-%m-%d %H:00",
            Interval::Day => "%Y-%m-%d",
        }
    }

    /// SQLite expression mapping the `timestamp` column (epoch ms) to the UTC
    /// bucket label. The timestamp is floored to the bucket width first so
    /// five-minute buckets start on multiples of five. SQLite's `/` and `%`
    /// truncate toward zero, so the remainder is normalized to keep
    /// pre-1970 timestamps in the bucket below them.
    pub fn bucket_sql(&self) -> String {
        let w = self.width_ms();
        format!(
            "strftime('{fmt}', (timestamp - (((timestamp % {w}) + {w}) % {w})) / 1000, 'unixepoch')",
            fmt = self.label_format(),
        )
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(Interval::for_duration(600_000), Interval::Minute);
        assert_eq!(Interval::for_duration(600_001), Interval::FiveMinutes);
        assert_eq!(Interval::for_duration(3_600_000), Interval::FiveMinutes);
        assert_eq!(Interval::for_duration(3_600_001), Interval::Hour);
        assert_eq!(Interval::for_duration(86_400_000), Interval::Hour);
        assert_eq!(Interval::for_duration(86_400_001), Interval::Day);
    }

    #[test]
    fn test_zero_duration_is_minute() {
        assert_eq!(Interval::for_duration(0), Interval::Minute);
    }

    #[test]
    fn test_names() {
        assert_eq!(Interval::Minute.as_str(), "minute");
        assert_eq!(Interval::FiveMinutes.as_str(), "5_minutes");
        assert_eq!(Interval::Hour.to_string(), "hour");
        assert_eq!(Interval::Day.to_string(), "day");
    }

    fn label(interval: Interval, ts: i64) -> String {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let sql = format!("SELECT {} FROM (SELECT ?1 AS timestamp)", interval.bucket_sql());
        conn.query_row(&sql, [ts], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_bucket_labels() {
        // 2023-10-10 06:07:31 UTC
        let ts = 1_696_918_051_000;
        assert_eq!(label(Interval::Minute, ts), "2023-10-10 06:07");
        assert_eq!(label(Interval::FiveMinutes, ts), "2023-10-10 06:05");
        assert_eq!(label(Interval::Hour, ts), "2023-10-10 06:00");
        assert_eq!(label(Interval::Day, ts), "2023-10-10");
    }

    #[test]
    fn test_five_minute_bucket_edges() {
        // 2023-10-10 06:05:00.000 and 06:09:59.999 share a bucket, 06:10 starts the next
        let start = 1_696_917_900_000;
        assert_eq!(label(Interval::FiveMinutes, start), "2023-10-10 06:05");
        assert_eq!(label(Interval::FiveMinutes, start + 299_999), "2023-10-10 06:05");
        assert_eq!(label(Interval::FiveMinutes, start + 300_000), "2023-10-10 06:10");
    }

    #[test]
    fn test_bucket_labels_before_epoch() {
        assert_eq!(label(Interval::Minute, -1), "1969-12-31 23:59");
        assert_eq!(label(Interval::Minute, -60_000), "1969-12-31 23:59");
        assert_eq!(label(Interval::Minute, -60_001), "1969-12-31 23:58");
        assert_eq!(label(Interval::FiveMinutes, -1), "1969-12-31 23:55");
        assert_eq!(label(Interval::Hour, -1), "1969-12-31 23:00");
        assert_eq!(label(Interval::Day, -1), "1969-12-31");
        assert_eq!(label(Interval::Day, 0), "1970-01-01");
    }
}
