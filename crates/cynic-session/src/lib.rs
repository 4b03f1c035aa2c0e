//! `cynic-session` — composition and the tick runner.
//!
//! A [`Session`] bundles events, status caches, and an optional alerter,
//! and drives a planner tick loop (1 Hz by convention) until a shutdown
//! signal flips. Startup order is alerter → caches → planner; shutdown
//! reverses it, with the alerter draining last.

pub mod error;
pub mod session;

pub use error::{Result, SessionError};
pub use session::Session;
