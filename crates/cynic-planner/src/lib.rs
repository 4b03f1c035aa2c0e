//! `cynic-planner` — the scheduling engine.
//!
//! An [`Event`] carries an interval, flags, hooks, and an optional JSON
//! endpoint fetch. The [`Planner`] owns a monotonic tick counter and a
//! min-heap of events keyed by absolute expiry tick; every
//! [`tick`](Planner::tick) executes whatever has expired and reschedules
//! the repeaters. The planner has no thread of its own — a session (or a
//! test) drives the tick at whatever cadence it wants, 1 Hz by
//! convention.
//!
//! # Tick arithmetic
//!
//! `add` at tick t with interval k schedules the event for absolute tick
//! t + k; `tick` advances the counter first, then drains every event
//! whose expiry is ≤ the new count. The first hook invocation therefore
//! lands on the k-th tick after `add`, and every k ticks thereafter for
//! a repeating event.

pub mod error;
pub mod event;
pub mod hook;
pub mod planner;
pub mod queue;

mod fetch;
mod id;

pub use error::{EventError, Result};
pub use event::Event;
pub use hook::{Hook, HookParameters, HookResult};
pub use planner::{Planner, PlannerHandle};
pub use queue::EventQueue;
