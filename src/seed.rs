use crate::storage::writer;
use crate::types::{LogStatus, NewLogEntry, RequestSnapshot};
use chrono::{Days, NaiveDate};
use deadpool_sqlite::Pool;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::collections::BTreeMap;

const DAY_MS: i64 = 86_400_000;

const FAILURE_MESSAGES: &[&str] = &[
    "Random failure occurred.",
    "Upstream timed out.",
    "Connection reset by peer.",
    "Downstream returned an unexpected payload.",
];

const HOSTS: &[&str] = &[
    "http://localhost:3000",
    "https://api.example.com",
    "https://staging.example.com",
];

/// Options for generating synthetic log history.
#[derive(Debug, Clone, clap::Args)]
pub struct SeedOptions {
    /// First day to generate (YYYY-MM-DD, UTC)
    #[arg(long, default_value = "2023-09-01")]
    pub from: NaiveDate,
    /// Last day to generate, inclusive (YYYY-MM-DD, UTC)
    #[arg(long, default_value = "2023-11-10")]
    pub to: NaiveDate,
    /// Entries written per day
    #[arg(long, default_value_t = 100)]
    pub per_day: usize,
    /// Size of the simulated user pool
    #[arg(long, default_value_t = 50)]
    pub users: usize,
}

fn user_pool(size: usize) -> Vec<String> {
    (1..=size.max(1)).map(|i| format!("user{i:03}")).collect()
}

/// Build `per_day` random entries spread over the UTC day starting at `day`.
pub fn generate_day<R: Rng>(
    rng: &mut R,
    day: NaiveDate,
    per_day: usize,
    users: &[String],
) -> Vec<NewLogEntry> {
    let day_start = day
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default();

    (0..per_day)
        .filter_map(|_| {
            let user_id = users.choose(rng)?.clone();
            let timestamp = day_start + rng.gen_range(0..DAY_MS);
            let host = HOSTS.choose(rng)?;

            let request = RequestSnapshot {
                headers: BTreeMap::from([
                    ("host".to_string(), host.to_string()),
                    ("connection".to_string(), "keep-alive".to_string()),
                    ("cache-control".to_string(), "max-age=0".to_string()),
                ]),
                query: BTreeMap::from([("userId".to_string(), user_id.clone())]),
                body: None,
            };

            let status = if rng.gen_bool(0.5) {
                LogStatus::Success
            } else {
                LogStatus::Failure
            };
            Some(match status {
                LogStatus::Success => NewLogEntry::success(
                    user_id,
                    timestamp,
                    request,
                    json!({ "status": 200, "message": "Hello, World!" }),
                ),
                LogStatus::Failure => {
                    let error = FAILURE_MESSAGES.choose(rng)?;
                    NewLogEntry::failure(
                        user_id,
                        timestamp,
                        request,
                        Some(json!({ "status": 500, "error": "Internal Server Error" })),
                        *error,
                    )
                }
            })
        })
        .collect()
}

/// Write synthetic entries for every day in `[from, to]`. Returns the number
/// of entries written.
pub async fn run(
    pool: &Pool,
    opts: &SeedOptions,
) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    if opts.from > opts.to {
        return Err(format!("--from {} is after --to {}", opts.from, opts.to).into());
    }

    let users = user_pool(opts.users);
    let mut rng = StdRng::from_entropy();
    let mut day = opts.from;
    let mut written = 0;

    while day <= opts.to {
        let entries = generate_day(&mut rng, day, opts.per_day, &users);
        written += entries.len();
        writer::write_batch(pool, entries).await?;
        tracing::debug!(day = %day, written, "seeded day");

        day = match day.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    tracing::info!(written, from = %opts.from, to = %opts.to, "database seeded");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_day_stays_within_day() {
        let mut rng = StdRng::seed_from_u64(7);
        let day = NaiveDate::from_ymd_opt(2023, 10, 10).unwrap();
        let users = user_pool(5);
        let entries = generate_day(&mut rng, day, 200, &users);

        // 2023-10-10 00:00:00 UTC
        let start = 1_696_896_000_000;
        assert_eq!(entries.len(), 200);
        for e in &entries {
            assert!(e.timestamp >= start && e.timestamp < start + DAY_MS);
            assert!(users.contains(&e.user_id));
            assert_eq!(e.request.query["userId"], e.user_id);
            match e.status {
                LogStatus::Success => assert!(e.error.is_none()),
                LogStatus::Failure => assert!(e.error.is_some()),
            }
        }
        assert!(entries.iter().any(|e| e.status == LogStatus::Success));
        assert!(entries.iter().any(|e| e.status == LogStatus::Failure));
    }

    #[test]
    fn test_user_pool_never_empty() {
        assert_eq!(user_pool(0), vec!["user001".to_string()]);
        assert_eq!(user_pool(3).len(), 3);
    }
}
