use crate::integration::init_tracing;
use crate::utils::{EventLog, TestNetwork};
use ghost_putt_core::{MessageKind, Player};
use ghost_putt_session::{DispatchOutcome, MessageProtocol, SessionEvent};
use serde_json::json;

#[tokio::test]
async fn test_broadcast_reaches_joiner() {
    init_tracing();

    let net = TestNetwork::new();
    let session = net.session(1).await;
    let (joiner, _) = &session.joiners[0];
    let joiner_log = EventLog::attach(joiner);
    assert!(session.wait_host_sees_all(2000).await);

    let host_player = Player {
        id: session.host_id.to_string(),
        name: "Host".into(),
        color: "#ef4444".into(),
        is_host: true,
        joined_at: 1,
    };
    let message = MessageProtocol::encode(
        MessageKind::PlayerJoined,
        json!(host_player),
        session.host_id.as_str(),
    );
    session.host.broadcast(message).await.expect("Broadcast failed");

    let host_id = session.host_id.to_string();
    assert!(
        joiner_log
            .wait_for(
                |e| matches!(
                    e,
                    SessionEvent::MessageDispatched { message, outcome: DispatchOutcome::Applied, .. }
                        if message.kind == MessageKind::PlayerJoined && message.from_player_id == host_id
                ),
                2000,
            )
            .await,
        "Joiner never dispatched the host's player-joined"
    );

    let state = joiner.state();
    let state = state.read().await;
    assert_eq!(state.player(&host_id).map(|p| p.name.as_str()), Some("Host"));
}
