use crate::protocol::DispatchOutcome;
use ghost_putt_core::{GameMessage, PeerId};

/// Published by the peer manager to every subscriber.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    PeerConnected(PeerId),
    PeerDisconnected(PeerId),
    LinkFailed { peer_id: PeerId, reason: String },
    MessageDispatched {
        from: PeerId,
        message: GameMessage,
        outcome: DispatchOutcome,
    },
}
