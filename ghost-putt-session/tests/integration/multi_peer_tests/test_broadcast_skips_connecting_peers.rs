use crate::integration::init_tracing;
use crate::utils::{EventLog, TestNetwork};
use ghost_putt_core::{MessageKind, RoomCode};
use ghost_putt_session::{MessageProtocol, SessionEvent};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_broadcast_skips_connecting_peers() {
    init_tracing();

    let net = TestNetwork::new();
    let code = RoomCode::generate();
    let host = net.manager();
    let host_id = host
        .create_host_connection(code.clone())
        .await
        .expect("Failed to host");

    // Nobody is connected yet: this message has no recipients and is not
    // queued for later.
    let early = MessageProtocol::encode(
        MessageKind::ShotTaken,
        json!({ "playerId": "host", "hole": 1 }),
        host_id.as_str(),
    );
    host.broadcast(early).await.expect("Broadcast failed");

    let joiner = net.manager();
    let joiner_log = EventLog::attach(&joiner);
    joiner
        .join_room(code, host_id)
        .await
        .expect("Failed to join");

    tokio::time::sleep(Duration::from_millis(300)).await;
    let shots = joiner_log
        .count(|e| {
            matches!(e, SessionEvent::MessageDispatched { message, .. } if message.kind == MessageKind::ShotTaken)
        })
        .await;
    assert_eq!(shots, 0);
    assert!(joiner.state().read().await.scores.is_empty());
}
