use crate::integration::init_tracing;
use crate::utils::{EventLog, TestNetwork, test_config};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use ghost_putt_core::{PeerId, RoomCode, SignalKind};
use ghost_putt_session::{
    LinkConnector, LinkDriver, PeerManager, SessionConfig, SessionError, SessionEvent,
    TransportEvent,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Accepts every call and never produces a single transport event.
struct SilentConnector;

struct SilentLink;

#[async_trait]
impl LinkConnector for SilentConnector {
    async fn connect(
        &self,
        _local: &PeerId,
        _remote: &PeerId,
        _initiator: bool,
        _events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn LinkDriver>> {
        Ok(Box::new(SilentLink))
    }
}

#[async_trait]
impl LinkDriver for SilentLink {
    async fn apply_signal(&self, _kind: SignalKind, _payload: Value) -> Result<()> {
        Ok(())
    }

    async fn send(&self, _data: Bytes) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_handshake_deadline() {
    init_tracing();

    let net = TestNetwork::with_config(SessionConfig {
        handshake_timeout_ms: 400,
        ..test_config()
    });
    let code = RoomCode::generate();
    let host = net.manager();
    let host_id = host
        .create_host_connection(code.clone())
        .await
        .expect("Failed to host");

    // The host acknowledges the join, but this joiner's link never opens.
    let joiner = PeerManager::spawn(
        net.config.clone(),
        Arc::new(net.relay.clone()),
        Arc::new(SilentConnector),
    );
    let joiner_log = EventLog::attach(&joiner);

    let started = Instant::now();
    let err = joiner
        .join_room(code, host_id.clone())
        .await
        .expect_err("Join should fail when the link never opens");

    match &err {
        SessionError::PeerUnreachable { peer_id, .. } => assert_eq!(peer_id, &host_id),
        other => panic!("expected PeerUnreachable, got {other:?}"),
    }
    assert!(started.elapsed() >= Duration::from_millis(400));
    assert!(started.elapsed() < Duration::from_secs(3));

    assert!(
        joiner_log
            .wait_for(
                |e| matches!(e, SessionEvent::LinkFailed { peer_id, .. } if peer_id == &host_id),
                1000,
            )
            .await
    );
    assert!(joiner.connected_peers().await.unwrap().is_empty());
}
