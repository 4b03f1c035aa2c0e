use serde::{Deserialize, Serialize};

/// Default port the status server listens on.
pub const DEFAULT_STATUS_PORT: u16 = 9999;

/// Default root path the snapshot is served under.
pub const DEFAULT_STATUS_ROOT: &str = "/status";

/// Status server configuration.
///
/// Deserializable so embedding applications can read it straight out of
/// their own config file; every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on. `0` requests an ephemeral port, discoverable
    /// through [`StatusCache::port`](crate::cache::StatusCache::port)
    /// after start.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root path of the snapshot route; a key suffix below it selects a
    /// single entry.
    #[serde(default = "default_root")]
    pub root: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            root: default_root(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_STATUS_PORT
}

fn default_root() -> String {
    DEFAULT_STATUS_ROOT.to_string()
}
