use crate::analytics::interval::Interval;
use crate::error::{AppError, AppResult};
use crate::types::{GraphBucket, LogEntry, LogFilter, LogStatus, Page, TimeRange};
use deadpool_sqlite::Pool;
use rusqlite::params;

/// Totals over a time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCounts {
    pub total_calls: i64,
    pub failed_calls: i64,
    pub unique_users: i64,
}

async fn conn(pool: &Pool) -> AppResult<deadpool_sqlite::Object> {
    pool.get()
        .await
        .map_err(|e| AppError::Internal(format!("pool error: {e}")))
}

fn parse_json_column(id: i64, column: &str, raw: Option<String>) -> Option<serde_json::Value> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(id, column, error = %e, "stored JSON column is not valid JSON");
            None
        }
    }
}

/// One page of entries in `[from, to]`, oldest first.
pub async fn list_logs(
    pool: &Pool,
    range: TimeRange,
    filter: LogFilter,
    page: Page,
) -> AppResult<Vec<LogEntry>> {
    let conn = conn(pool).await?;

    conn.interact(move |conn| {
        let mut sql = String::from(
            "SELECT id, user_id, timestamp, status, error, request, response
             FROM api_logs WHERE timestamp >= ?1 AND timestamp <= ?2",
        );
        let mut bind_values: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(range.from()), Box::new(range.to())];

        if let Some(status) = filter.status {
            sql.push_str(&format!(" AND status = ?{}", bind_values.len() + 1));
            bind_values.push(Box::new(status.as_str()));
        }

        sql.push_str(&format!(
            " ORDER BY timestamp ASC, id ASC LIMIT ?{} OFFSET ?{}",
            bind_values.len() + 1,
            bind_values.len() + 2
        ));
        bind_values.push(Box::new(page.limit()));
        bind_values.push(Box::new(page.offset()));

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            bind_values.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), |row| {
            let status: String = row.get(3)?;
            let status = LogStatus::parse(&status).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("unknown status: {status}").into(),
                )
            })?;
            let id: i64 = row.get(0)?;
            Ok(LogEntry {
                id,
                user_id: row.get(1)?,
                timestamp: row.get(2)?,
                status,
                error: row.get(4)?,
                request: parse_json_column(id, "request", row.get(5)?),
                response: parse_json_column(id, "response", row.get(6)?),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
    })
    .await?
    .map_err(AppError::from)
}

/// Total calls, failed calls and distinct callers in `[from, to]`.
pub async fn range_counts(pool: &Pool, range: TimeRange) -> AppResult<RangeCounts> {
    let conn = conn(pool).await?;

    conn.interact(move |conn| {
        conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN status = 'Failure' THEN 1 ELSE 0 END), 0),
                    COUNT(DISTINCT user_id)
             FROM api_logs WHERE timestamp >= ?1 AND timestamp <= ?2",
            params![range.from(), range.to()],
            |row| {
                Ok(RangeCounts {
                    total_calls: row.get(0)?,
                    failed_calls: row.get(1)?,
                    unique_users: row.get(2)?,
                })
            },
        )
    })
    .await?
    .map_err(AppError::from)
}

/// Group entries in `[from, to]` into time buckets sized for the range.
pub async fn aggregate_buckets(pool: &Pool, range: TimeRange) -> AppResult<Vec<GraphBucket>> {
    let interval = Interval::for_duration(range.duration_ms());
    let sql = format!(
        "SELECT {bucket} AS bucket,
                COUNT(*),
                SUM(CASE WHEN status = 'Success' THEN 1 ELSE 0 END),
                SUM(CASE WHEN status = 'Failure' THEN 1 ELSE 0 END),
                COUNT(DISTINCT user_id)
         FROM api_logs
         WHERE timestamp >= ?1 AND timestamp <= ?2
         GROUP BY bucket
         ORDER BY bucket ASC",
        bucket = interval.bucket_sql(),
    );
    let conn = conn(pool).await?;

    let buckets = conn
        .interact(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![range.from(), range.to()], |row| {
                Ok(GraphBucket {
                    bucket: row.get(0)?,
                    total: row.get(1)?,
                    success: row.get(2)?,
                    failure: row.get(3)?,
                    unique_users: row.get(4)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await??;

    tracing::debug!(
        interval = %interval,
        buckets = buckets.len(),
        "aggregated graph data"
    );
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::writer::write_batch;
    use crate::types::{NewLogEntry, RequestSnapshot};

    async fn test_pool() -> (Pool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::config::DatabaseConfig {
            path: dir.path().join("test.db"),
            pool_size: 2,
        };
        let pool = crate::storage::sqlite::create_pool(&config).unwrap();
        crate::storage::sqlite::init_pool(&pool).await.unwrap();
        (pool, dir)
    }

    fn entry(user: &str, ts: i64, ok: bool) -> NewLogEntry {
        if ok {
            NewLogEntry::success(user, ts, RequestSnapshot::default(), serde_json::json!({"status": 200}))
        } else {
            NewLogEntry::failure(user, ts, RequestSnapshot::default(), None, "boom")
        }
    }

    // 2023-10-10 06:00:00 UTC
    const BASE: i64 = 1_696_917_600_000;

    #[tokio::test]
    async fn test_list_logs_pages_in_timestamp_order() {
        let (pool, _dir) = test_pool().await;
        // Insert out of order to make sure sorting comes from the query
        let entries: Vec<_> = (0..25).rev().map(|i| entry("u", BASE + i * 1000, true)).collect();
        write_batch(&pool, entries).await.unwrap();

        let range = TimeRange::new(BASE, BASE + 60_000).unwrap();
        let page2 = list_logs(&pool, range, LogFilter::default(), Page::new(Some(2), Some(10), 10, 200))
            .await
            .unwrap();
        let stamps: Vec<i64> = page2.iter().map(|e| e.timestamp).collect();
        let expected: Vec<i64> = (10..20).map(|i| BASE + i * 1000).collect();
        assert_eq!(stamps, expected);

        let page3 = list_logs(&pool, range, LogFilter::default(), Page::new(Some(3), Some(10), 10, 200))
            .await
            .unwrap();
        assert_eq!(page3.len(), 5);
        assert_eq!(page3[0].timestamp, BASE + 20_000);

        let page4 = list_logs(&pool, range, LogFilter::default(), Page::new(Some(4), Some(10), 10, 200))
            .await
            .unwrap();
        assert!(page4.is_empty());
    }

    #[tokio::test]
    async fn test_list_logs_range_is_inclusive_and_filters_status() {
        let (pool, _dir) = test_pool().await;
        write_batch(
            &pool,
            vec![
                entry("a", BASE - 1, true),
                entry("a", BASE, true),
                entry("b", BASE + 500, false),
                entry("c", BASE + 1000, true),
                entry("c", BASE + 1001, false),
            ],
        )
        .await
        .unwrap();

        let range = TimeRange::new(BASE, BASE + 1000).unwrap();
        let page = Page::new(None, None, 10, 200);
        let all = list_logs(&pool, range, LogFilter::default(), page).await.unwrap();
        assert_eq!(all.len(), 3);

        let failures = list_logs(
            &pool,
            range,
            LogFilter {
                status: Some(LogStatus::Failure),
            },
            page,
        )
        .await
        .unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].user_id, "b");
        assert_eq!(failures[0].error.as_deref(), Some("boom"));
        assert!(failures[0].response.is_none());
    }

    #[tokio::test]
    async fn test_range_counts() {
        let (pool, _dir) = test_pool().await;
        write_batch(
            &pool,
            vec![
                entry("a", BASE, true),
                entry("a", BASE + 1, false),
                entry("b", BASE + 2, false),
                entry("z", BASE + 10_000, false),
            ],
        )
        .await
        .unwrap();

        let counts = range_counts(&pool, TimeRange::new(BASE, BASE + 2).unwrap())
            .await
            .unwrap();
        assert_eq!(
            counts,
            RangeCounts {
                total_calls: 3,
                failed_calls: 2,
                unique_users: 2,
            }
        );

        let empty = range_counts(&pool, TimeRange::new(0, 1).unwrap()).await.unwrap();
        assert_eq!(empty.total_calls, 0);
        assert_eq!(empty.failed_calls, 0);
    }

    #[tokio::test]
    async fn test_aggregate_buckets_hourly() {
        let (pool, _dir) = test_pool().await;
        write_batch(
            &pool,
            vec![
                entry("a", BASE + 60_000, true),
                entry("a", BASE + 120_000, false),
                entry("b", BASE + 180_000, true),
                entry("c", BASE + 3_600_000 + 5, true),
                entry("d", BASE + 7 * 3_600_000, false),
            ],
        )
        .await
        .unwrap();

        // 12 hour range -> hourly buckets
        let range = TimeRange::new(BASE, BASE + 12 * 3_600_000).unwrap();
        let buckets = aggregate_buckets(&pool, range).await.unwrap();

        let labels: Vec<&str> = buckets.iter().map(|b| b.bucket.as_str()).collect();
        assert_eq!(
            labels,
            vec!["2023-10-10 06:00", "2023-10-10 07:00", "2023-10-10 13:00"]
        );
        assert_eq!(
            buckets[0],
            GraphBucket {
                bucket: "2023-10-10 06:00".to_string(),
                total: 3,
                success: 2,
                failure: 1,
                unique_users: 2,
            }
        );
        for b in &buckets {
            assert_eq!(b.success + b.failure, b.total);
            assert!(b.unique_users <= b.total);
        }
    }

    #[tokio::test]
    async fn test_aggregate_buckets_five_minutes() {
        let (pool, _dir) = test_pool().await;
        write_batch(
            &pool,
            vec![
                entry("a", BASE + 4 * 60_000, true),
                entry("b", BASE + 5 * 60_000, true),
                entry("b", BASE + 9 * 60_000 + 59_999, false),
            ],
        )
        .await
        .unwrap();

        let range = TimeRange::new(BASE, BASE + 3_600_000).unwrap();
        let buckets = aggregate_buckets(&pool, range).await.unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].bucket, "2023-10-10 06:00");
        assert_eq!(buckets[1].bucket, "2023-10-10 06:05");
        assert_eq!(buckets[1].total, 2);
        assert_eq!(buckets[1].unique_users, 1);
    }

    #[tokio::test]
    async fn test_aggregate_buckets_empty_range() {
        let (pool, _dir) = test_pool().await;
        let buckets = aggregate_buckets(&pool, TimeRange::new(BASE, BASE + 1).unwrap())
            .await
            .unwrap();
        assert!(buckets.is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_buckets_before_epoch() {
        let (pool, _dir) = test_pool().await;
        write_batch(
            &pool,
            vec![
                entry("a", -60_001, true),
                entry("a", -1, true),
                entry("b", 0, false),
            ],
        )
        .await
        .unwrap();

        let range = TimeRange::new(-120_000, 0).unwrap();
        let buckets = aggregate_buckets(&pool, range).await.unwrap();
        let labels: Vec<&str> = buckets.iter().map(|b| b.bucket.as_str()).collect();
        assert_eq!(
            labels,
            vec!["1969-12-31 23:58", "1969-12-31 23:59", "1970-01-01 00:00"]
        );
        assert!(buckets.iter().all(|b| b.total == 1));
    }

    #[tokio::test]
    async fn test_list_logs_tolerates_corrupt_json_columns() {
        let (pool, _dir) = test_pool().await;
        write_batch(&pool, vec![entry("a", BASE, true)]).await.unwrap();

        let conn = pool.get().await.unwrap();
        conn.interact(|conn| {
            conn.execute(
                "UPDATE api_logs SET request = '{not json', response = 'nope'",
                [],
            )
        })
        .await
        .unwrap()
        .unwrap();

        let range = TimeRange::new(BASE, BASE).unwrap();
        let logs = list_logs(&pool, range, LogFilter::default(), Page::new(None, None, 10, 200))
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].request.is_none());
        assert!(logs[0].response.is_none());
        assert_eq!(logs[0].user_id, "a");
    }
}
