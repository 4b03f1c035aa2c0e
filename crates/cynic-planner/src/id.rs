use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique event id. Ids start at 1 and never repeat
/// within a process, regardless of which thread allocates.
pub(crate) fn next_event_id() -> u64 {
    NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed)
}
