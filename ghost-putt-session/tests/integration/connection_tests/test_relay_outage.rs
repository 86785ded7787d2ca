use crate::integration::init_tracing;
use crate::utils::TestNetwork;
use ghost_putt_core::RoomCode;
use ghost_putt_session::SessionError;

#[tokio::test]
async fn test_relay_outage() {
    init_tracing();

    let net = TestNetwork::new();
    net.relay.set_available(false);
    let host = net.manager();

    let err = host
        .create_host_connection(RoomCode::generate())
        .await
        .expect_err("Hosting should fail while the relay is down");
    assert!(matches!(err, SessionError::SignalingUnavailable(_)), "got {err:?}");

    net.relay.set_available(true);
    host.create_host_connection(RoomCode::generate())
        .await
        .expect("Hosting should work once the relay is back");
}
