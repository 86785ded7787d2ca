use crate::integration::init_tracing;
use crate::utils::{EventLog, TestNetwork};
use ghost_putt_session::SessionEvent;

#[tokio::test]
async fn test_link_failure_is_contained() {
    init_tracing();

    let net = TestNetwork::new();
    let session = net.session(2).await;
    let host_log = EventLog::attach(&session.host);
    assert!(session.wait_host_sees_all(2000).await);

    let (broken, broken_id) = &session.joiners[0];
    let (_, healthy_id) = &session.joiners[1];
    let broken_log = EventLog::attach(broken);

    net.network.sever(&session.host_id, broken_id);

    assert!(
        host_log
            .wait_for(
                |e| matches!(e, SessionEvent::LinkFailed { peer_id, .. } if peer_id == broken_id),
                2000,
            )
            .await,
        "Host should report the failed link"
    );
    assert!(broken_log.wait_disconnected(&session.host_id, 2000).await);

    assert_eq!(session.host.connected_peers().await.unwrap(), vec![healthy_id.clone()]);
    assert!(broken.connected_peers().await.unwrap().is_empty());

    let failures = host_log
        .count(|e| matches!(e, SessionEvent::LinkFailed { .. }))
        .await;
    assert_eq!(failures, 1);
}
