use crate::config::PipelineConfig;
use crate::storage::writer;
use crate::types::NewLogEntry;
use deadpool_sqlite::Pool;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// Log writer: consumes entries from the channel, batches them,
/// and flushes to SQLite on batch size or time trigger.
pub async fn run_worker(mut rx: mpsc::Receiver<NewLogEntry>, pool: Pool, config: PipelineConfig) {
    let batch_size = config.flush_batch_size.max(1);
    let mut buffer: Vec<NewLogEntry> = Vec::with_capacity(batch_size);
    let flush_interval = Duration::from_secs(config.flush_interval_secs.max(1));
    let mut flush_timer = time::interval(flush_interval);
    flush_timer.tick().await; // skip first immediate tick

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Some(entry) => {
                        buffer.push(entry);
                        if buffer.len() >= batch_size {
                            flush(&pool, &mut buffer).await;
                        }
                    }
                    None => {
                        // Channel closed - drain remaining
                        tracing::info!("log channel closed, draining buffer");
                        if !buffer.is_empty() {
                            flush(&pool, &mut buffer).await;
                        }
                        return;
                    }
                }
            }
            _ = flush_timer.tick() => {
                if !buffer.is_empty() {
                    flush(&pool, &mut buffer).await;
                }
            }
        }
    }
}

/// Write the buffered entries once. A failed batch is reported and dropped;
/// callers already have their responses.
async fn flush(pool: &Pool, buffer: &mut Vec<NewLogEntry>) {
    let entries = std::mem::take(buffer);
    let count = entries.len();

    if let Err(e) = writer::write_batch(pool, entries).await {
        tracing::error!(error = %e, count, "log flush failed, batch dropped");
    }
}
