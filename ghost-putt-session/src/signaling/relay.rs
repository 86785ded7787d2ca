use anyhow::Result;
use async_trait::async_trait;
use ghost_putt_core::{PeerId, SignalingMessage};
use tokio::sync::mpsc;

/// A live registration on a relay. Dropping it releases the identity.
pub struct RelaySession {
    pub peer_id: PeerId,
    pub outbound: mpsc::UnboundedSender<SignalingMessage>,
    pub inbound: mpsc::UnboundedReceiver<SignalingMessage>,
}

/// Rendezvous service that hands out identities and forwards signaling
/// messages to the peer named in `to_peer_id`.
#[async_trait]
pub trait SignalingRelay: Send + Sync {
    /// Registers with the relay, asking for `requested` when given.
    async fn connect(&self, requested: Option<PeerId>) -> Result<RelaySession>;
}
