//! `cynic-alert` — background alert conduit.
//!
//! Hooks flag observations for alerting; the [`Alerter`] consumer buffers
//! them and hands batches to a user [`AlertSink`] on a fixed flush
//! interval. The producer side ([`AlerterHandle`]) never blocks: the
//! channel is unbounded, so a slow sink delays flushes, not event
//! execution. The cost is unbounded buffering if the sink stalls for a
//! long stretch.

pub mod alerter;
pub mod types;

pub use alerter::{Alerter, AlerterHandle};
pub use types::{AlertMessage, AlertSink};
