use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, warn};

use cynic_alert::{AlertMessage, AlerterHandle};
use cynic_status::StatusCache;

use crate::error::{EventError, Result};
use crate::fetch;
use crate::hook::{Hook, HookParameters};
use crate::id::next_event_id;
use crate::planner::PlannerHandle;

/// Bound on a JSON event's endpoint round-trip.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A schedulable unit: an interval, flags, hooks, and an optional JSON
/// endpoint fetch, identified by a process-unique id.
///
/// Events are configured up front (builder methods, not thread-safe) and
/// then handed to a planner, which owns them from that point on.
pub struct Event {
    id: u64,
    url: Option<reqwest::Url>,
    client: Option<reqwest::Client>,
    label: Option<String>,
    hooks: Vec<Arc<dyn Hook>>,
    extra: Option<Value>,
    cache: Option<Arc<StatusCache>>,
    alerter: Option<AlerterHandle>,

    pub(crate) interval_secs: u64,
    pub(crate) offset_secs: u64,
    pub(crate) immediate: bool,
    pub(crate) repeat: bool,

    // Maintained by the planner and its queue.
    pub(crate) abs_expiry: u64,
    pub(crate) deleted: bool,
    pub(crate) index: usize,
}

impl Event {
    /// Pure-execution event firing every `interval_secs`.
    pub fn new(interval_secs: u64) -> Result<Self> {
        if interval_secs == 0 {
            return Err(EventError::InvalidInterval {
                secs: interval_secs,
            });
        }

        Ok(Self {
            id: next_event_id(),
            url: None,
            client: None,
            label: None,
            hooks: Vec::new(),
            extra: None,
            cache: None,
            alerter: None,
            interval_secs,
            offset_secs: 0,
            immediate: false,
            repeat: false,
            abs_expiry: 0,
            deleted: false,
            index: 0,
        })
    }

    /// Event that GETs `url` and stores the parsed JSON body (or an error
    /// record) in the bound cache before running its hooks.
    pub fn new_json(url: &str, interval_secs: u64) -> Result<Self> {
        let parsed = reqwest::Url::parse(url).map_err(|e| EventError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| EventError::HttpClient {
                reason: e.to_string(),
            })?;

        let mut event = Self::new(interval_secs)?;
        event.url = Some(parsed);
        event.client = Some(client);
        Ok(event)
    }

    // --- configuration -----------------------------------------------------

    /// Append a hook; hooks run in registration order.
    pub fn with_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Extra delay, in seconds, applied only the first time the event is
    /// scheduled.
    pub fn with_offset(mut self, offset_secs: u64) -> Self {
        self.offset_secs = offset_secs;
        self
    }

    /// Fire on the next tick (after any offset) instead of a full
    /// interval from now.
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Reschedule after every execution.
    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Opaque user context handed to every hook invocation.
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn with_cache(mut self, cache: Arc<StatusCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Change the recurrence period. For a repeating event this takes
    /// effect on the next reschedule.
    pub fn set_interval(&mut self, interval_secs: u64) -> Result<()> {
        if interval_secs == 0 {
            return Err(EventError::InvalidInterval {
                secs: interval_secs,
            });
        }
        self.interval_secs = interval_secs;
        Ok(())
    }

    /// Bind the alert conduit. The session does this for every event it
    /// registers.
    pub fn set_alerter(&mut self, alerter: AlerterHandle) {
        self.alerter = Some(alerter);
    }

    pub fn set_cache(&mut self, cache: Arc<StatusCache>) {
        self.cache = Some(cache);
    }

    // --- accessors -----------------------------------------------------------

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn offset_secs(&self) -> u64 {
        self.offset_secs
    }

    pub fn is_immediate(&self) -> bool {
        self.immediate
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn hooks_len(&self) -> usize {
        self.hooks.len()
    }

    pub fn endpoint_url(&self) -> Option<&reqwest::Url> {
        self.url.as_ref()
    }

    /// Absolute tick this event is due on. Maintained by the planner;
    /// zero until first scheduled.
    pub fn abs_expiry(&self) -> u64 {
        self.abs_expiry
    }

    /// Cache key for this event's observations: `"{label}-{id}"` when
    /// labelled, `"{id}"` otherwise.
    pub fn unique_key(&self) -> String {
        match &self.label {
            Some(label) => format!("{label}-{}", self.id),
            None => self.id.to_string(),
        }
    }

    // --- execution -----------------------------------------------------------

    /// Run one firing: the optional endpoint fetch, then every hook in
    /// registration order.
    ///
    /// Fetch problems end up as error records in the cache; a panicking
    /// hook is caught and logged without stopping the hooks after it.
    pub(crate) async fn execute(&self, planner: &PlannerHandle) {
        if let (Some(url), Some(client), Some(cache)) = (&self.url, &self.client, &self.cache) {
            fetch::fetch_into_cache(client, url, cache, &self.unique_key()).await;
        } else if self.url.is_some() {
            warn!(event = %self, "json event has no cache bound — skipping fetch");
        }

        let params = HookParameters {
            planner: planner.clone(),
            cache: self.cache.clone(),
            extra: self.extra.clone(),
        };

        for (position, hook) in self.hooks.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| hook.run(&params))) {
                Ok(result) => {
                    if result.alert {
                        self.send_alert(result.payload);
                    }
                }
                Err(_) => {
                    error!(
                        event_id = self.id,
                        position, "hook panicked — continuing with remaining hooks"
                    );
                }
            }
        }
    }

    /// Compose and enqueue an alert. With no alerter bound the flag is
    /// silently ignored.
    fn send_alert(&self, payload: Value) {
        let Some(alerter) = &self.alerter else {
            return;
        };

        let hostname = gethostname::gethostname()
            .into_string()
            .unwrap_or_else(|_| "badhost".to_string());
        let endpoint = self
            .url
            .as_ref()
            .map(|url| url.to_string())
            .unwrap_or_default();

        alerter.send(AlertMessage {
            response: payload,
            endpoint,
            now: Utc::now().to_rfc3339(),
            hostname,
        });
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event<id:{} url:{} secs:{} immediate:{} offset:{} repeat:{} label:{} hooks:{}>",
            self.id,
            self.url.as_ref().map(|url| url.as_str()).unwrap_or("-"),
            self.interval_secs,
            self.immediate,
            self.offset_secs,
            self.repeat,
            self.label.as_deref().unwrap_or("-"),
            self.hooks.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::HookResult;

    #[test]
    fn zero_interval_is_rejected() {
        assert!(matches!(
            Event::new(0),
            Err(EventError::InvalidInterval { secs: 0 })
        ));
        assert!(matches!(
            Event::new_json("http://localhost/x", 0),
            Err(EventError::InvalidInterval { secs: 0 })
        ));
    }

    #[test]
    fn malformed_url_is_rejected() {
        assert!(matches!(
            Event::new_json("not a url at all", 30),
            Err(EventError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn unique_key_uses_label_when_present() {
        let plain = Event::new(5).unwrap();
        assert_eq!(plain.unique_key(), plain.id().to_string());

        let labelled = Event::new(5).unwrap().with_label("disk");
        assert_eq!(labelled.unique_key(), format!("disk-{}", labelled.id()));
    }

    #[test]
    fn builder_configures_flags_and_hooks() {
        let event = Event::new(7)
            .unwrap()
            .with_immediate(true)
            .with_repeat(true)
            .with_offset(3)
            .with_label("probe")
            .with_hook(|_: &HookParameters| HookResult::ok("fine"))
            .with_hook(|_: &HookParameters| HookResult::ok("also fine"));

        assert!(event.is_immediate());
        assert!(event.is_repeating());
        assert_eq!(event.offset_secs(), 3);
        assert_eq!(event.interval_secs(), 7);
        assert_eq!(event.label(), Some("probe"));
        assert_eq!(event.hooks_len(), 2);
    }

    #[test]
    fn set_interval_validates() {
        let mut event = Event::new(7).unwrap();
        assert!(event.set_interval(0).is_err());
        assert_eq!(event.interval_secs(), 7);

        event.set_interval(90).unwrap();
        assert_eq!(event.interval_secs(), 90);
    }

    #[test]
    fn ids_are_monotonically_distinct() {
        let a = Event::new(1).unwrap();
        let b = Event::new(1).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn display_summarizes_configuration() {
        let event = Event::new_json("http://localhost:9999/status", 60)
            .unwrap()
            .with_label("upstream");
        let rendered = event.to_string();
        assert!(rendered.contains("secs:60"));
        assert!(rendered.contains("label:upstream"));
        assert!(rendered.contains("http://localhost:9999/status"));
    }
}
