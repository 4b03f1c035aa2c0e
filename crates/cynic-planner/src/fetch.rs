use std::sync::Arc;

use reqwest::{Client, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use cynic_status::StatusCache;

/// GET the endpoint and store the outcome in the cache under `key`.
///
/// Transport errors, non-2xx statuses, body-read failures, and JSON
/// decode failures all become `{"error": <reason>}` records — the
/// scheduler itself never sees them.
pub(crate) async fn fetch_into_cache(client: &Client, url: &Url, cache: &Arc<StatusCache>, key: &str) {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(%url, error = %e, "problem getting response");
            cache.update(key, error_record("problem getting response"));
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(%url, status = status.as_u16(), "endpoint answered with non-2xx code");
        cache.update(
            key,
            error_record(&format!("got non 2xx code: {}", status.as_u16())),
        );
        return;
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            warn!(%url, error = %e, "problem reading data from endpoint");
            cache.update(key, error_record("problem reading data from endpoint"));
            return;
        }
    };

    match serde_json::from_slice::<Value>(&body) {
        Ok(parsed) => {
            debug!(%url, key, "endpoint observation stored");
            cache.update(key, parsed);
        }
        Err(e) => {
            warn!(%url, error = %e, "json decoding failed");
            cache.update(key, error_record("problem decoding endpoint json"));
        }
    }
}

fn error_record(reason: &str) -> Value {
    json!({ "error": reason })
}
