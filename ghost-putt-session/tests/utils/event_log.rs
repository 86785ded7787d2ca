use ghost_putt_core::{MessageKind, PeerId};
use ghost_putt_session::{DispatchOutcome, PeerManagerHandle, SessionEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;

/// Records every session event a manager publishes.
#[derive(Clone)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventLog {
    /// Subscribe before triggering the action under test, or early events
    /// are missed.
    pub fn attach(handle: &PeerManagerHandle) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut rx = handle.subscribe();
        let sink = events.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => sink.lock().await.push(event),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { events }
    }

    pub async fn snapshot(&self) -> Vec<SessionEvent> {
        self.events.lock().await.clone()
    }

    pub async fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&SessionEvent) -> bool,
    {
        self.events.lock().await.iter().filter(|e| pred(e)).count()
    }

    /// Polls until an event matches or `timeout_ms` passes.
    pub async fn wait_for<F>(&self, pred: F, timeout_ms: u64) -> bool
    where
        F: Fn(&SessionEvent) -> bool,
    {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.events.lock().await.iter().any(&pred) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn wait_connected(&self, peer: &PeerId, timeout_ms: u64) -> bool {
        self.wait_for(
            |e| matches!(e, SessionEvent::PeerConnected(p) if p == peer),
            timeout_ms,
        )
        .await
    }

    pub async fn wait_disconnected(&self, peer: &PeerId, timeout_ms: u64) -> bool {
        self.wait_for(
            |e| match e {
                SessionEvent::PeerDisconnected(p) => p == peer,
                SessionEvent::LinkFailed { peer_id, .. } => peer_id == peer,
                _ => false,
            },
            timeout_ms,
        )
        .await
    }
}

pub fn is_dispatch(event: &SessionEvent, kind: &MessageKind, outcome: DispatchOutcome) -> bool {
    matches!(
        event,
        SessionEvent::MessageDispatched { message, outcome: o, .. }
            if &message.kind == kind && *o == outcome
    )
}
