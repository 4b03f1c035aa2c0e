use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use cynic_alert::Alerter;
use cynic_planner::{Event, Planner};
use cynic_status::StatusCache;

use crate::error::Result;

/// Conventional tick cadence.
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Composition of events, status caches, and an optional alerter, plus
/// the runner that drives planner ticks.
pub struct Session {
    pub events: Vec<Event>,
    pub status_caches: Vec<Arc<StatusCache>>,
    pub alerter: Option<Alerter>,
    /// Tick cadence; one second by convention. Tests shorten it.
    pub tick_period: Duration,
}

impl Session {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            status_caches: Vec::new(),
            alerter: None,
            tick_period: TICK_PERIOD,
        }
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_status_cache(mut self, cache: Arc<StatusCache>) -> Self {
        self.status_caches.push(cache);
        self
    }

    pub fn with_alerter(mut self, alerter: Alerter) -> Self {
        self.alerter = Some(alerter);
        self
    }

    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    /// Run the session until `shutdown` flips to true.
    ///
    /// Startup: alerter first, then every status cache (a bind failure
    /// aborts startup), then a planner with every configured event
    /// registered — the alerter handle bound into each. The loop then
    /// ticks the planner once per `tick_period`. On shutdown the tick
    /// loop halts with in-flight hooks completed, caches stop, and the
    /// alerter drains its final flush. Pending events are discarded.
    pub async fn start(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        if let Some(alerter) = self.alerter.as_mut() {
            alerter.start();
        }

        for cache in &self.status_caches {
            cache.start().await?;
        }

        let mut planner = Planner::new();
        let alert_handle = self.alerter.as_ref().map(|alerter| alerter.handle());
        for mut event in self.events.drain(..) {
            if let Some(handle) = &alert_handle {
                event.set_alerter(handle.clone());
            }
            planner.add(event);
        }

        info!(
            events = planner.len(),
            caches = self.status_caches.len(),
            "session started"
        );

        let mut interval = tokio::time::interval(self.tick_period);
        // The first interval tick completes immediately; the planner's
        // clock should only start moving a full period in.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    planner.tick().await;
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        for cache in &self.status_caches {
            cache.stop().await;
        }
        if let Some(alerter) = self.alerter.as_mut() {
            alerter.stop().await;
        }

        info!(ticks = planner.ticks(), "session stopped");
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
