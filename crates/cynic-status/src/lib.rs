//! `cynic-status` — concurrent status cache with an HTTP JSON snapshot.
//!
//! Hooks and endpoint fetches write observations into a [`StatusCache`];
//! an axum server exposes the whole map as one JSON object at the
//! configured root path, and any single key at `{root}/{key}`.
//!
//! Lifecycle: the cache is created before the planner starts and stopped
//! after it stops. The map operations work with or without the server
//! running.

pub mod cache;
pub mod config;
pub mod error;
pub mod server;

pub use cache::StatusCache;
pub use config::StatusConfig;
pub use error::{Result, StatusError};
