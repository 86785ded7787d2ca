use crate::integration::init_tracing;
use crate::utils::TestNetwork;
use ghost_putt_core::RoomCode;
use ghost_putt_session::SessionError;

#[tokio::test]
async fn test_wrong_room_code() {
    init_tracing();

    let net = TestNetwork::new();
    let host = net.manager();
    let host_id = host
        .create_host_connection(RoomCode::parse("ABC234").unwrap())
        .await
        .expect("Failed to host");

    let joiner = net.manager();
    let err = joiner
        .join_room(RoomCode::parse("XYZ789").unwrap(), host_id)
        .await
        .expect_err("Host should refuse a different room code");

    assert!(matches!(err, SessionError::PeerUnreachable { .. }), "got {err:?}");
    assert!(host.connected_peers().await.unwrap().is_empty());
}
