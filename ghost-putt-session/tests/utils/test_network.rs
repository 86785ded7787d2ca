use ghost_putt_core::{PeerId, RoomCode};
use ghost_putt_session::{MemoryNetwork, MemoryRelay, PeerManager, PeerManagerHandle, SessionConfig};
use std::sync::Arc;

/// One in-process relay and data network shared by every manager a test
/// creates.
#[derive(Clone)]
pub struct TestNetwork {
    pub relay: MemoryRelay,
    pub network: MemoryNetwork,
    pub config: SessionConfig,
}

impl TestNetwork {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            relay: MemoryRelay::new(),
            network: MemoryNetwork::new(),
            config,
        }
    }

    pub fn manager(&self) -> PeerManagerHandle {
        PeerManager::spawn(
            self.config.clone(),
            Arc::new(self.relay.clone()),
            Arc::new(self.network.clone()),
        )
    }

    /// Host plus `joiners` connected joiners.
    pub async fn session(&self, joiners: usize) -> TestSession {
        let code = RoomCode::generate();
        let host = self.manager();
        let host_id = host
            .create_host_connection(code.clone())
            .await
            .expect("Failed to host");

        let mut joined = Vec::new();
        for _ in 0..joiners {
            let joiner = self.manager();
            let joiner_id = joiner
                .join_room(code.clone(), host_id.clone())
                .await
                .expect("Failed to join");
            joined.push((joiner, joiner_id));
        }

        TestSession {
            code,
            host,
            host_id,
            joiners: joined,
        }
    }
}

pub struct TestSession {
    pub code: RoomCode,
    pub host: PeerManagerHandle,
    pub host_id: PeerId,
    pub joiners: Vec<(PeerManagerHandle, PeerId)>,
}

impl TestSession {
    /// Waits until the host reports every joiner connected.
    pub async fn wait_host_sees_all(&self, timeout_ms: u64) -> bool {
        let expected: Vec<PeerId> = self.joiners.iter().map(|(_, id)| id.clone()).collect();
        wait_for_peers(&self.host, expected, timeout_ms).await
    }
}

/// Polls `handle` until its connected set equals `expected`.
pub async fn wait_for_peers(
    handle: &PeerManagerHandle,
    mut expected: Vec<PeerId>,
    timeout_ms: u64,
) -> bool {
    expected.sort();
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        if let Ok(peers) = handle.connected_peers().await {
            if peers == expected {
                return true;
            }
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

/// Polls a plain condition, for state that settles on another task.
pub async fn wait_until<F>(condition: F, timeout_ms: u64) -> bool
where
    F: Fn() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    while !condition() {
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    true
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        signaling_timeout_ms: 500,
        handshake_timeout_ms: 2_000,
        broadcast_interval_ms: 100,
        ..SessionConfig::default()
    }
}
