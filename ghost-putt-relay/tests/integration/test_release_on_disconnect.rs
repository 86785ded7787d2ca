use crate::integration::init_tracing;
use crate::utils::TestRelay;
use ghost_putt_core::PeerId;
use ghost_putt_session::signaling::SignalingRelay;
use ghost_putt_session::WsRelay;

#[tokio::test]
async fn test_release_on_disconnect() {
    init_tracing();

    let relay = TestRelay::start().await;
    let client = WsRelay::new(relay.url.clone());
    let id = PeerId::from("short-lived");

    let session = client.connect(Some(id.clone())).await.expect("Register failed");
    assert!(relay.service.is_registered(&id));

    drop(session);
    assert!(
        relay.wait_until(|s| !s.is_registered(&id), 2000).await,
        "Relay kept the identity after the socket closed"
    );

    client
        .connect(Some(id))
        .await
        .expect("Released id should be reusable");
}
