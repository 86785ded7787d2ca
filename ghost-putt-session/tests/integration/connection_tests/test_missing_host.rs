use crate::integration::init_tracing;
use crate::utils::{TestNetwork, test_config};
use ghost_putt_core::{PeerId, RoomCode};
use ghost_putt_session::{SessionConfig, SessionError};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_missing_host() {
    init_tracing();

    let net = TestNetwork::with_config(SessionConfig {
        handshake_timeout_ms: 300,
        ..test_config()
    });
    let joiner = net.manager();

    let started = Instant::now();
    let err = joiner
        .join_room(RoomCode::generate(), PeerId::from("no-such-host"))
        .await
        .expect_err("Join should fail without a host");

    assert!(matches!(err, SessionError::PeerUnreachable { .. }), "got {err:?}");
    assert!(err.is_retryable());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(joiner.connected_peers().await.unwrap().is_empty());
    assert_eq!(joiner.local_peer_id().await.unwrap(), None);
}
