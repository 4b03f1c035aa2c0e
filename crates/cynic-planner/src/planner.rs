use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::event::Event;
use crate::queue::EventQueue;

/// Scheduling engine: a monotonic tick counter plus a min-heap of events
/// keyed by absolute expiry tick.
///
/// One task owns the planner and calls [`tick`](Planner::tick); hooks run
/// synchronously on that task. Other tasks (and hooks mid-fire) reach the
/// planner through the channel-backed [`PlannerHandle`].
pub struct Planner {
    ticks: u64,
    queue: EventQueue,
    inbox_tx: mpsc::UnboundedSender<Event>,
    inbox_rx: mpsc::UnboundedReceiver<Event>,
}

/// Non-owning handle for adding events from hooks or other tasks.
///
/// Handle-added events enter the queue at the start of the next tick,
/// scheduled against the tick count current when that tick begins: an
/// event with interval k added mid-fire on tick t fires on tick t + k.
#[derive(Clone)]
pub struct PlannerHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl PlannerHandle {
    /// Queue `event` for scheduling and return its id.
    pub fn add(&self, event: Event) -> u64 {
        let id = event.id();
        if self.tx.send(event).is_err() {
            warn!(event_id = id, "planner is gone — event dropped");
        }
        id
    }
}

impl Planner {
    pub fn new() -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            ticks: 0,
            queue: EventQueue::new(),
            inbox_tx,
            inbox_rx,
        }
    }

    /// Handle for dynamic event addition.
    pub fn handle(&self) -> PlannerHandle {
        PlannerHandle {
            tx: self.inbox_tx.clone(),
        }
    }

    /// Number of queued events, tombstones included.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Current tick count.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Schedule `event` and return its id.
    pub fn add(&mut self, event: Event) -> u64 {
        let id = event.id();
        self.schedule(event);
        id
    }

    /// Mark the queued event with `id` for deletion. It is discarded,
    /// unexecuted, when it reaches the heap root, and never rescheduled.
    /// Returns whether the id was known to the queue.
    pub fn delete(&mut self, id: u64) -> bool {
        let known = self.queue.mark_deleted(id);
        if known {
            debug!(event_id = id, "event marked deleted");
        }
        known
    }

    /// Advance time by one tick and execute everything that has expired.
    ///
    /// Expired events run sequentially on the caller's task; a repeating
    /// event is rescheduled after it ran. Every event expiring on this
    /// tick completes before `tick` returns. An empty queue is a no-op
    /// beyond the counter increment.
    pub async fn tick(&mut self) {
        self.drain_inbox();
        self.ticks += 1;

        loop {
            match self.queue.peek_expiry() {
                Some(expiry) if expiry <= self.ticks => {
                    let Some(event) = self.queue.pop() else {
                        break;
                    };
                    if event.deleted {
                        debug!(event_id = event.id(), "discarding deleted event");
                        continue;
                    }

                    debug!(event_id = event.id(), tick = self.ticks, "event expired");
                    let handle = self.handle();
                    event.execute(&handle).await;

                    if event.repeat {
                        self.schedule(event);
                    }
                }
                _ => break,
            }
        }
    }

    // --- internal ----------------------------------------------------------

    /// Move externally-added events into the queue. Runs at the top of
    /// every tick, before the counter advances, so handle adds are
    /// scheduled against the tick count their producers observed.
    fn drain_inbox(&mut self) {
        while let Ok(event) = self.inbox_rx.try_recv() {
            self.schedule(event);
        }
    }

    /// Compute the absolute expiry and push onto the queue.
    ///
    /// First-time scheduling consumes `offset` and `immediate`: an
    /// immediate event expires `offset + 1` ticks from now, anything else
    /// `offset + interval` ticks from now. Reschedules of a repeating
    /// event then use the bare interval.
    fn schedule(&mut self, mut event: Event) {
        if event.immediate {
            event.abs_expiry = self.ticks + event.offset_secs + 1;
            event.immediate = false;
        } else {
            event.abs_expiry = self.ticks + event.offset_secs + event.interval_secs;
        }
        event.offset_secs = 0;

        debug!(
            event_id = event.id(),
            abs_expiry = event.abs_expiry,
            "event scheduled"
        );
        self.queue.push(event);
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Planner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Planner<ticks:{} queued:{}>", self.ticks, self.queue.len())
    }
}
