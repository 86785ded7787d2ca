use bytes::Bytes;
use ghost_putt_core::{PeerId, SignalKind};
use serde_json::Value;

/// Events a transport reports back to the peer manager loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// Local handshake payload (SDP or ICE) that must reach the remote peer
    /// through signaling.
    Signal(PeerId, SignalKind, Value),

    /// The data channel is open in both directions.
    Open(PeerId),

    /// A frame arrived from the remote peer.
    Message(PeerId, Bytes),

    /// The remote side went away cleanly.
    Closed(PeerId),

    /// The connection broke.
    Failed(PeerId, String),
}

impl TransportEvent {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            TransportEvent::Signal(peer_id, ..)
            | TransportEvent::Open(peer_id)
            | TransportEvent::Message(peer_id, _)
            | TransportEvent::Closed(peer_id)
            | TransportEvent::Failed(peer_id, _) => peer_id,
        }
    }
}
