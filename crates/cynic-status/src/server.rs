use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::cache::{ServerState, StatusCache};
use crate::error::{Result, StatusError};

/// Bound on how long `stop` waits for in-flight requests.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Handler state: just the shared map, detached from the cache's own
/// lifecycle bookkeeping.
#[derive(Clone)]
struct Routes {
    entries: Arc<DashMap<String, Value>>,
}

impl StatusCache {
    /// Bind the listener and start serving the snapshot routes in the
    /// background.
    ///
    /// Port `0` in the config requests an ephemeral port; the assigned
    /// one is available through [`port`](StatusCache::port) once this
    /// returns. Bind failures are fatal and returned to the caller.
    pub async fn start(&self) -> Result<()> {
        {
            let server = self.server.lock().expect("status server state poisoned");
            if server.is_some() {
                return Err(StatusError::AlreadyStarted);
            }
        }

        let addr = format!("{}:{}", self.config.bind, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| StatusError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local = listener
            .local_addr()
            .map_err(|source| StatusError::Bind { addr, source })?;
        self.port.store(local.port(), Ordering::Release);

        let router = build_router(Arc::clone(&self.entries), &self.config.root);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let shutdown = async move {
                // Err means the cache was dropped; treat as a stop request.
                let _ = shutdown_rx.changed().await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "status server exited with error");
            }
        });

        let mut server = self.server.lock().expect("status server state poisoned");
        if server.is_some() {
            task.abort();
            return Err(StatusError::AlreadyStarted);
        }
        *server = Some(ServerState {
            shutdown: shutdown_tx,
            task,
        });

        info!(port = local.port(), root = %self.config.root, "status server listening");
        Ok(())
    }

    /// Gracefully stop the server, waiting up to 30 s for in-flight
    /// requests. A cache that was never started is a no-op.
    pub async fn stop(&self) {
        let state = self
            .server
            .lock()
            .expect("status server state poisoned")
            .take();
        let Some(state) = state else {
            return;
        };

        let _ = state.shutdown.send(true);
        let abort = state.task.abort_handle();
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, state.task).await {
            Ok(Ok(())) => info!("status server stopped"),
            Ok(Err(e)) => warn!(error = %e, "status server task failed during shutdown"),
            Err(_) => {
                warn!("status server did not stop in time — aborting");
                abort.abort();
            }
        }
    }
}

fn build_router(entries: Arc<DashMap<String, Value>>, root: &str) -> Router {
    let root = normalize_root(root);
    let key_route = if root == "/" {
        "/*key".to_string()
    } else {
        format!("{root}/*key")
    };

    Router::new()
        .route(&root, get(snapshot_handler))
        .route(&key_route, get(key_handler))
        .with_state(Routes { entries })
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Ensure a leading slash and no trailing slash so the key route nests
/// cleanly under the root. An empty or all-slash root serves from `/`.
fn normalize_root(root: &str) -> String {
    let trimmed = root.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// GET `{root}` — the full snapshot as one JSON object.
async fn snapshot_handler(State(routes): State<Routes>) -> impl IntoResponse {
    json_response(&snapshot_value(&routes.entries))
}

/// GET `{root}/{key}` — a single value, or `null` when absent. The path
/// extractor URL-decodes the key; an empty suffix serves the full
/// snapshot.
async fn key_handler(State(routes): State<Routes>, Path(key): Path<String>) -> impl IntoResponse {
    if key.is_empty() {
        return json_response(&snapshot_value(&routes.entries));
    }
    let value = routes
        .entries
        .get(&key)
        .map(|entry| entry.value().clone())
        .unwrap_or(Value::Null);
    json_response(&value)
}

fn snapshot_value(entries: &DashMap<String, Value>) -> Value {
    let mut snapshot = serde_json::Map::new();
    for entry in entries.iter() {
        snapshot.insert(entry.key().clone(), entry.value().clone());
    }
    Value::Object(snapshot)
}

/// Encode `value`, degrading to an error body on failure. Encoder
/// problems are logged and served as 200 with error JSON, never 5xx.
fn json_response(value: &Value) -> impl IntoResponse {
    let body = match serde_json::to_string(value) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "problem generating json for status endpoint");
            r#"{"error":"could not format status data"}"#.to_string()
        }
    };
    ([(header::CONTENT_TYPE, "application/json")], body)
}
