use crate::types::NewLogEntry;
use deadpool_sqlite::Pool;
use rusqlite::params;

/// Batch-write log entries to SQLite in a single transaction.
pub async fn write_batch(
    pool: &Pool,
    entries: Vec<NewLogEntry>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if entries.is_empty() {
        return Ok(());
    }

    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let tx = conn.transaction()?;

        {
            let mut insert = tx.prepare_cached(
                "INSERT INTO api_logs (user_id, timestamp, status, error, request, response)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for entry in &entries {
                let request = serde_json::to_string(&entry.request)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                let response = entry.response.as_ref().map(|v| v.to_string());

                insert.execute(params![
                    entry.user_id,
                    entry.timestamp,
                    entry.status.as_str(),
                    entry.error,
                    request,
                    response,
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(count = entries.len(), "flushed log batch to sqlite");
        Ok::<_, rusqlite::Error>(())
    })
    .await
    .map_err(|e| format!("interact error: {e}"))??;

    Ok(())
}
