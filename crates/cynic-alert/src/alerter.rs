use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::{AlertMessage, AlertSink};

/// Cloneable producer side of the alert conduit.
///
/// Sends never block. Messages sent after the alerter's consumer exited
/// are dropped with a warning.
#[derive(Clone)]
pub struct AlerterHandle {
    tx: mpsc::UnboundedSender<AlertMessage>,
}

impl AlerterHandle {
    /// Queue a message for the next flush.
    pub fn send(&self, message: AlertMessage) {
        if self.tx.send(message).is_err() {
            warn!("alerter consumer is gone — alert message dropped");
        }
    }
}

/// Background aggregator that batches alert messages to a user sink.
///
/// Lifecycle: [`start`](Alerter::start) before any event may emit,
/// [`stop`](Alerter::stop) drains the channel into one final flush.
pub struct Alerter {
    flush_every: Duration,
    sink: Arc<dyn AlertSink>,
    tx: mpsc::UnboundedSender<AlertMessage>,
    rx: Option<mpsc::UnboundedReceiver<AlertMessage>>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl Alerter {
    pub fn new(flush_every: Duration, sink: Arc<dyn AlertSink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            flush_every,
            sink,
            tx,
            rx: Some(rx),
            shutdown: None,
            task: None,
        }
    }

    /// Producer handle to bind into events.
    pub fn handle(&self) -> AlerterHandle {
        AlerterHandle {
            tx: self.tx.clone(),
        }
    }

    /// Launch the consumer task. Calling `start` twice is a no-op.
    pub fn start(&mut self) {
        let Some(rx) = self.rx.take() else {
            warn!("alerter already started");
            return;
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let consumer = Consumer {
            rx,
            shutdown: shutdown_rx,
            sink: Arc::clone(&self.sink),
            buffer: Vec::new(),
        };

        self.shutdown = Some(shutdown_tx);
        self.task = Some(tokio::spawn(consumer.run(self.flush_every)));
        info!(flush_every_ms = self.flush_every.as_millis() as u64, "alerter started");
    }

    /// Stop the consumer. Anything still in the channel is drained and
    /// handed to the sink in one final flush before the task exits.
    pub async fn stop(&mut self) {
        let (Some(shutdown), Some(task)) = (self.shutdown.take(), self.task.take()) else {
            warn!("alerter is not running");
            return;
        };

        let _ = shutdown.send(true);
        if task.await.is_err() {
            warn!("alerter consumer task panicked");
        }
        info!("alerter stopped");
    }
}

/// The background half: owns the receiver and the pending buffer.
struct Consumer {
    rx: mpsc::UnboundedReceiver<AlertMessage>,
    shutdown: watch::Receiver<bool>,
    sink: Arc<dyn AlertSink>,
    buffer: Vec<AlertMessage>,
}

impl Consumer {
    async fn run(mut self, flush_every: Duration) {
        let mut interval = tokio::time::interval(flush_every);
        // The first interval tick completes immediately; skip it so the
        // first real flush lands a full period after start.
        interval.tick().await;

        loop {
            tokio::select! {
                Some(message) = self.rx.recv() => {
                    self.buffer.push(message);
                }
                _ = interval.tick() => {
                    self.flush();
                }
                res = self.shutdown.changed() => {
                    // Err means the alerter itself was dropped; treat it
                    // as a stop request.
                    if res.is_err() || *self.shutdown.borrow() {
                        self.drain();
                        self.flush();
                        return;
                    }
                }
            }
        }
    }

    /// Pull everything still sitting in the channel into the buffer.
    fn drain(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.buffer.push(message);
        }
    }

    /// Hand the buffered batch to the sink. Empty buffers are skipped.
    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.buffer);
        debug!(count = batch.len(), "flushing alert batch");
        self.sink.deliver(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn message(n: u64) -> AlertMessage {
        AlertMessage {
            response: serde_json::json!({ "n": n }),
            endpoint: String::new(),
            now: String::new(),
            hostname: "testhost".to_string(),
        }
    }

    /// Sink that records every batch it receives.
    struct Recorder {
        batches: Mutex<Vec<Vec<AlertMessage>>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                batches: Mutex::new(Vec::new()),
            })
        }

        fn total(&self) -> usize {
            self.batches.lock().unwrap().iter().map(Vec::len).sum()
        }

        fn batch_count(&self) -> usize {
            self.batches.lock().unwrap().len()
        }
    }

    impl AlertSink for Recorder {
        fn deliver(&self, batch: Vec<AlertMessage>) {
            self.batches.lock().unwrap().push(batch);
        }
    }

    #[tokio::test]
    async fn stop_flushes_everything_sent() {
        let recorder = Recorder::new();
        let mut alerter = Alerter::new(Duration::from_secs(3600), recorder.clone());
        alerter.start();

        let handle = alerter.handle();
        for n in 0..25 {
            handle.send(message(n));
        }
        alerter.stop().await;

        // Multiset law: everything sent between start and stop reaches
        // the sink, here in the single draining flush.
        assert_eq!(recorder.total(), 25);

        let batches = recorder.batches.lock().unwrap();
        let mut seen: Vec<u64> = batches
            .iter()
            .flatten()
            .map(|m| m.response["n"].as_u64().unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..25).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_flush_batches_by_interval() {
        let recorder = Recorder::new();
        let mut alerter = Alerter::new(Duration::from_millis(100), recorder.clone());
        alerter.start();

        let handle = alerter.handle();
        handle.send(message(1));
        handle.send(message(2));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(recorder.total(), 2);
        assert_eq!(recorder.batch_count(), 1);

        handle.send(message(3));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(recorder.total(), 3);
        assert_eq!(recorder.batch_count(), 2);

        alerter.stop().await;
        assert_eq!(recorder.total(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_intervals_do_not_flush() {
        let recorder = Recorder::new();
        let mut alerter = Alerter::new(Duration::from_millis(50), recorder.clone());
        alerter.start();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(recorder.batch_count(), 0);

        alerter.stop().await;
        assert_eq!(recorder.batch_count(), 0);
    }

    #[tokio::test]
    async fn double_start_and_stop_are_noops() {
        let recorder = Recorder::new();
        let mut alerter = Alerter::new(Duration::from_secs(1), recorder.clone());
        alerter.start();
        alerter.start();
        alerter.stop().await;
        alerter.stop().await;
    }

    #[tokio::test]
    async fn send_after_stop_is_dropped() {
        let recorder = Recorder::new();
        let mut alerter = Alerter::new(Duration::from_secs(1), recorder.clone());
        let handle = alerter.handle();
        alerter.start();
        alerter.stop().await;

        handle.send(message(9));
        assert_eq!(recorder.total(), 0);
    }

    #[test]
    fn alert_message_wire_names() {
        let json = serde_json::to_value(message(7)).unwrap();
        assert!(json.get("response_text").is_some());
        assert!(json.get("cynic_hostname").is_some());
        assert!(json.get("response").is_none());
    }
}
