use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single alert-flagged observation. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Payload the hook returned alongside its alert flag.
    #[serde(rename = "response_text")]
    pub response: Value,

    /// Endpoint URL of the originating event; empty for pure-execution
    /// events.
    pub endpoint: String,

    /// RFC 3339 timestamp taken when the alert was composed.
    pub now: String,

    /// Hostname of the machine running the scheduler.
    #[serde(rename = "cynic_hostname")]
    pub hostname: String,
}

/// Receives batched alert messages from the alerter's consumer task.
///
/// `deliver` is called synchronously on the consumer task, never on the
/// tick task — sink latency only delays subsequent flushes.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, batch: Vec<AlertMessage>);
}

impl<F> AlertSink for F
where
    F: Fn(Vec<AlertMessage>) + Send + Sync,
{
    fn deliver(&self, batch: Vec<AlertMessage>) {
        self(batch)
    }
}
