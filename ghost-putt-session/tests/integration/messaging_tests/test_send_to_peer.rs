use crate::integration::init_tracing;
use crate::utils::{EventLog, TestNetwork, is_dispatch};
use ghost_putt_core::{MessageKind, PeerId};
use ghost_putt_session::{DispatchOutcome, MessageProtocol, SessionEvent};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_send_to_peer() {
    init_tracing();

    let net = TestNetwork::new();
    let session = net.session(2).await;
    let (first, first_id) = &session.joiners[0];
    let (second, _) = &session.joiners[1];
    let first_log = EventLog::attach(first);
    let second_log = EventLog::attach(second);
    assert!(session.wait_host_sees_all(2000).await);

    let ghost = MessageProtocol::encode(
        MessageKind::GhostBallUpdate,
        json!({ "playerId": "someone", "position": { "x": 1.0, "y": 2.0, "velocityX": 0.0, "velocityY": 0.0, "isMoving": false } }),
        session.host_id.as_str(),
    );
    session
        .host
        .send_to_peer(first_id.clone(), ghost.clone())
        .await
        .expect("Send failed");

    // Unknown targets are ignored.
    session
        .host
        .send_to_peer(PeerId::from("nobody"), ghost)
        .await
        .expect("Send failed");

    let is_ghost = |e: &SessionEvent| is_dispatch(e, &MessageKind::GhostBallUpdate, DispatchOutcome::Applied);
    assert!(first_log.wait_for(is_ghost, 2000).await);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(second_log.count(is_ghost).await, 0);
    assert!(first.state().read().await.ghost_ball("someone").is_some());
}
