use crate::integration::init_tracing;
use crate::utils::{EventLog, TestNetwork, is_dispatch};
use ghost_putt_core::{MessageKind, RoomCode};
use ghost_putt_session::{DispatchOutcome, SessionEvent};
use std::time::Duration;

#[tokio::test]
async fn test_state_broadcast_stops() {
    init_tracing();

    let net = TestNetwork::new();
    let session = net.session(1).await;
    let (joiner, _) = &session.joiners[0];
    let joiner_log = EventLog::attach(joiner);
    assert!(session.wait_host_sees_all(2000).await);

    let state_update = |e: &SessionEvent| is_dispatch(e, &MessageKind::StateUpdate, DispatchOutcome::Applied);
    assert!(joiner_log.wait_for(state_update, 2000).await);

    session.host.disconnect().await;
    assert!(joiner_log.wait_disconnected(&session.host_id, 2000).await);
    let after_disconnect = joiner_log.count(state_update).await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(
        joiner_log.count(state_update).await,
        after_disconnect,
        "No state-update may arrive after the host disconnected"
    );

    // Hosting again with nobody connected stays silent too.
    let code = RoomCode::generate();
    session
        .host
        .create_host_connection(code)
        .await
        .expect("Failed to host again");
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(joiner_log.count(state_update).await, after_disconnect);
}
