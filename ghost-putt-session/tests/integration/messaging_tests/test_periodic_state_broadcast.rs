use crate::integration::init_tracing;
use crate::utils::{EventLog, TestNetwork, is_dispatch};
use ghost_putt_core::{GameStatus, MessageKind, SessionState};
use ghost_putt_session::{DispatchOutcome, MessageProtocol};
use serde_json::json;

#[tokio::test]
async fn test_periodic_state_broadcast() {
    init_tracing();

    let net = TestNetwork::new();
    let session = net.session(1).await;
    let (joiner, joiner_id) = &session.joiners[0];
    let joiner_log = EventLog::attach(joiner);
    let host_log = EventLog::attach(&session.host);
    assert!(session.wait_host_sees_all(2000).await);

    {
        let state = session.host.state();
        let mut state = state.write().await;
        state.game_status = GameStatus::Playing;
        state.current_hole = 2;
    }

    assert!(
        joiner_log
            .wait_for(
                |e| is_dispatch(e, &MessageKind::StateUpdate, DispatchOutcome::Applied),
                2000,
            )
            .await,
        "Joiner never received a state broadcast"
    );
    let mut synced = false;
    for _ in 0..50 {
        if joiner.state().read().await.game_status == GameStatus::Playing {
            synced = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(synced, "Joiner state never caught up");
    assert_eq!(joiner.state().read().await.current_hole, 2);

    // A state-update coming back to the host is not merged.
    let echo = MessageProtocol::encode(
        MessageKind::StateUpdate,
        json!(SessionState::default().snapshot()),
        joiner_id.as_str(),
    );
    joiner.broadcast(echo).await.expect("Broadcast failed");

    assert!(
        host_log
            .wait_for(
                |e| is_dispatch(e, &MessageKind::StateUpdate, DispatchOutcome::Ignored),
                2000,
            )
            .await
    );
    assert_eq!(session.host.state().read().await.game_status, GameStatus::Playing);
}
