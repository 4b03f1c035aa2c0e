use std::sync::Arc;

use serde_json::Value;

use cynic_status::StatusCache;

use crate::planner::PlannerHandle;

/// What a hook hands back: whether to raise an alert, and an opaque JSON
/// payload forwarded on its behalf.
#[derive(Debug, Clone)]
pub struct HookResult {
    pub alert: bool,
    pub payload: Value,
}

impl HookResult {
    /// A result that raises no alert.
    pub fn ok(payload: impl Into<Value>) -> Self {
        Self {
            alert: false,
            payload: payload.into(),
        }
    }

    /// A result flagged for the alert conduit.
    pub fn alert(payload: impl Into<Value>) -> Self {
        Self {
            alert: true,
            payload: payload.into(),
        }
    }
}

/// State passed into every hook invocation.
pub struct HookParameters {
    /// Non-owning handle to the driving planner, so hooks can add more
    /// events mid-fire.
    pub planner: PlannerHandle,

    /// The status cache bound to the event, if any.
    pub cache: Option<Arc<StatusCache>>,

    /// Opaque user context configured on the event.
    pub extra: Option<Value>,
}

/// User callable run during an event's execution.
///
/// Hooks run sequentially on the tick task and should finish well within
/// one tick; long-running work is the hook's job to spawn off. A panic is
/// caught and logged, and does not stop the hooks after it.
pub trait Hook: Send + Sync {
    fn run(&self, params: &HookParameters) -> HookResult;
}

impl<F> Hook for F
where
    F: Fn(&HookParameters) -> HookResult + Send + Sync,
{
    fn run(&self, params: &HookParameters) -> HookResult {
        self(params)
    }
}
