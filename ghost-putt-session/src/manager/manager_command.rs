use crate::error::SessionError;
use ghost_putt_core::{GameMessage, PeerId, RoomCode};
use tokio::sync::oneshot;

pub type Reply<T> = oneshot::Sender<T>;

/// Requests sent from a [`PeerManagerHandle`](crate::PeerManagerHandle) to the
/// manager loop.
#[derive(Debug)]
pub enum ManagerCommand {
    CreateHost {
        code: RoomCode,
        reply: Reply<Result<PeerId, SessionError>>,
    },

    /// Answered only once the link to the host is connected or has failed.
    Join {
        code: RoomCode,
        host: PeerId,
        reply: Reply<Result<PeerId, SessionError>>,
    },

    Broadcast { message: GameMessage },

    SendToPeer { peer_id: PeerId, message: GameMessage },

    Disconnect { reply: Reply<()> },

    ConnectedPeers { reply: Reply<Vec<PeerId>> },

    LocalPeerId { reply: Reply<Option<PeerId>> },
}
