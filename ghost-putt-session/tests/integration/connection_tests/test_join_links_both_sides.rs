use crate::integration::init_tracing;
use crate::utils::{EventLog, TestNetwork};
use ghost_putt_core::RoomCode;

#[tokio::test]
async fn test_join_links_both_sides() {
    init_tracing();

    let net = TestNetwork::new();
    let code = RoomCode::generate();

    let host = net.manager();
    let host_log = EventLog::attach(&host);
    let host_id = host
        .create_host_connection(code.clone())
        .await
        .expect("Failed to host");

    let joiner = net.manager();
    let joiner_id = joiner
        .join_room(code, host_id.clone())
        .await
        .expect("Failed to join");

    assert!(
        host_log.wait_connected(&joiner_id, 2000).await,
        "Host never saw the joiner connect"
    );

    assert_eq!(host.connected_peers().await.unwrap(), vec![joiner_id.clone()]);
    assert_eq!(joiner.connected_peers().await.unwrap(), vec![host_id.clone()]);
    assert_eq!(host.local_peer_id().await.unwrap(), Some(host_id));
    assert_eq!(joiner.local_peer_id().await.unwrap(), Some(joiner_id));
}
