use crate::error::SessionError;
use crate::manager::manager_command::{ManagerCommand, Reply};
use crate::manager::session_event::SessionEvent;
use ghost_putt_core::{GameMessage, PeerId, RoomCode, SessionState};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc, oneshot};

/// Cloneable front door to a running [`PeerManager`](crate::PeerManager).
/// The manager stops once every handle is dropped.
#[derive(Clone)]
pub struct PeerManagerHandle {
    commands: mpsc::Sender<ManagerCommand>,
    events: broadcast::Sender<SessionEvent>,
    state: Arc<RwLock<SessionState>>,
}

impl PeerManagerHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<ManagerCommand>,
        events: broadcast::Sender<SessionEvent>,
        state: Arc<RwLock<SessionState>>,
    ) -> Self {
        Self {
            commands,
            events,
            state,
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> ManagerCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| SessionError::ManagerClosed)?;
        rx.await.map_err(|_| SessionError::ManagerClosed)
    }

    async fn post(&self, command: ManagerCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::ManagerClosed)
    }

    /// Hosts `code` and returns the local identity joiners should target.
    pub async fn create_host_connection(&self, code: RoomCode) -> Result<PeerId, SessionError> {
        self.request(|reply| ManagerCommand::CreateHost { code, reply })
            .await?
    }

    /// Resolves once the data link to `host` is connected.
    pub async fn join_room(&self, code: RoomCode, host: PeerId) -> Result<PeerId, SessionError> {
        self.request(|reply| ManagerCommand::Join { code, host, reply })
            .await?
    }

    /// Sends to every connected peer. Peers still connecting miss it.
    pub async fn broadcast(&self, message: GameMessage) -> Result<(), SessionError> {
        self.post(ManagerCommand::Broadcast { message }).await
    }

    pub async fn send_to_peer(
        &self,
        peer_id: PeerId,
        message: GameMessage,
    ) -> Result<(), SessionError> {
        self.post(ManagerCommand::SendToPeer { peer_id, message })
            .await
    }

    /// Leaves the current session. Does nothing if there is none, or if the
    /// manager already stopped.
    pub async fn disconnect(&self) {
        let _ = self
            .request(|reply| ManagerCommand::Disconnect { reply })
            .await;
    }

    /// Snapshot; it goes stale as peers come and go.
    pub async fn connected_peers(&self) -> Result<Vec<PeerId>, SessionError> {
        self.request(|reply| ManagerCommand::ConnectedPeers { reply })
            .await
    }

    pub async fn local_peer_id(&self) -> Result<Option<PeerId>, SessionError> {
        self.request(|reply| ManagerCommand::LocalPeerId { reply })
            .await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> Arc<RwLock<SessionState>> {
        self.state.clone()
    }
}
