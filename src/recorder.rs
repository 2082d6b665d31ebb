use crate::types::{NewLogEntry, RequestSnapshot};
use axum::http::HeaderMap;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::mpsc;

/// Headers whose values never reach the log store.
const REDACTED_HEADERS: &[&str] = &["authorization", "cookie", "proxy-authorization"];

/// Hands log entries to the background writer without waiting on storage.
#[derive(Clone)]
pub struct LogRecorder {
    tx: mpsc::Sender<NewLogEntry>,
}

impl LogRecorder {
    pub fn new(tx: mpsc::Sender<NewLogEntry>) -> Self {
        Self { tx }
    }

    /// Enqueue an entry. A full or closed channel drops the entry with a warning.
    pub fn record(&self, entry: NewLogEntry) {
        if let Err(e) = self.tx.try_send(entry) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "channel full",
                mpsc::error::TrySendError::Closed(_) => "channel closed",
            };
            tracing::warn!(reason, "log entry dropped");
        }
    }

    /// Fraction of the channel currently occupied, approximate.
    pub fn buffer_usage(&self) -> f64 {
        1.0 - (self.tx.capacity() as f64 / self.tx.max_capacity() as f64)
    }
}

/// Capture headers, query parameters and body of an inbound request.
pub fn snapshot_request(
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    body: Option<serde_json::Value>,
) -> RequestSnapshot {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                "[redacted]".to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), value)
        })
        .collect();

    RequestSnapshot {
        headers,
        query: query
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
        body,
    }
}
