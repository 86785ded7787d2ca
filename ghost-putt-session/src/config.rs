use ghost_putt_core::IceServerConfig;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:9000/ws";

/// Session tuning. Every field has a default so a partial TOML/JSON document
/// deserializes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub relay_url: String,
    pub ice_servers: Vec<IceServerConfig>,
    /// Bound on obtaining an identity from the relay.
    pub signaling_timeout_ms: u64,
    /// Bound on the join acknowledgement and on link establishment.
    pub handshake_timeout_ms: u64,
    /// Host state broadcast period.
    pub broadcast_interval_ms: u64,
    pub event_capacity: usize,
}

impl SessionConfig {
    pub fn signaling_timeout(&self) -> Duration {
        Duration::from_millis(self.signaling_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }

    pub fn stun_urls(&self) -> Vec<String> {
        self.ice_servers
            .iter()
            .flat_map(|server| server.urls.iter().cloned())
            .collect()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_owned(),
            ice_servers: vec![IceServerConfig {
                urls: vec![
                    "stun:stun.l.google.com:19302".to_owned(),
                    "stun:stun1.l.google.com:19302".to_owned(),
                ],
                username: None,
                credential: None,
            }],
            signaling_timeout_ms: 5_000,
            handshake_timeout_ms: 15_000,
            broadcast_interval_ms: 1_000,
            event_capacity: 256,
        }
    }
}
