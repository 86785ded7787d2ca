use serde::Deserialize;
use std::net::SocketAddr;

pub const DEFAULT_BIND: &str = "127.0.0.1:9000";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Route the WebSocket endpoint is mounted on.
    pub path: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            path: "/ws".to_owned(),
        }
    }
}
