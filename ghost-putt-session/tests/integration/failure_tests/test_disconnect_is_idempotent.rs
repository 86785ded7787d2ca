use crate::integration::init_tracing;
use crate::utils::{EventLog, TestNetwork, wait_for_peers, wait_until};
use ghost_putt_core::RoomCode;

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    init_tracing();

    let net = TestNetwork::new();
    let session = net.session(1).await;
    let (joiner, joiner_id) = &session.joiners[0];
    let joiner_log = EventLog::attach(joiner);
    assert!(session.wait_host_sees_all(2000).await);

    session.host.disconnect().await;
    session.host.disconnect().await;

    assert!(
        joiner_log.wait_disconnected(&session.host_id, 2000).await,
        "Joiner should see the host leave"
    );
    assert!(session.host.connected_peers().await.unwrap().is_empty());
    assert_eq!(session.host.local_peer_id().await.unwrap(), None);
    assert!(wait_until(|| !net.relay.is_registered(&session.host_id), 2000).await);

    // The same manager can host again.
    let code = RoomCode::generate();
    let host_id = session
        .host
        .create_host_connection(code.clone())
        .await
        .expect("Failed to host again");
    let rejoined_id = joiner
        .join_room(code, host_id.clone())
        .await
        .expect("Failed to rejoin");
    assert_ne!(&host_id, &session.host_id);
    assert_ne!(&rejoined_id, joiner_id);
    assert!(wait_for_peers(&session.host, vec![rejoined_id], 2000).await);
}
