use axum::extract::ws::Message;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ghost_putt_core::{PeerId, RelayFrame, SignalingMessage};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("peer id {0} is already registered")]
    IdTaken(PeerId),
}

struct RelayInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

/// Identity registry and message router shared by every socket.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
            }),
        }
    }

    /// Claims `requested`, or a fresh random id.
    pub fn register(
        &self,
        requested: Option<PeerId>,
        tx: mpsc::UnboundedSender<Message>,
    ) -> Result<PeerId, RegisterError> {
        let peer_id = requested.unwrap_or_default();
        match self.inner.peers.entry(peer_id.clone()) {
            Entry::Occupied(_) => Err(RegisterError::IdTaken(peer_id)),
            Entry::Vacant(slot) => {
                slot.insert(tx);
                Ok(peer_id)
            }
        }
    }

    pub fn unregister(&self, peer_id: &PeerId) {
        if self.inner.peers.remove(peer_id).is_some() {
            debug!("Released {}", peer_id);
        }
    }

    pub fn is_registered(&self, peer_id: &PeerId) -> bool {
        self.inner.peers.contains_key(peer_id)
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    /// Stamps the sender and delivers to `to_peer_id`. Anything without a
    /// reachable recipient is dropped.
    pub fn forward(&self, from: &PeerId, mut msg: SignalingMessage) {
        msg.from_peer_id = from.clone();
        let Some(recipient) = msg.to_peer_id.clone() else {
            warn!("Dropping {} from {}: no recipient", msg.kind, from);
            return;
        };
        if !self.is_registered(&recipient) {
            warn!("Dropping {} from {}: {} is not connected", msg.kind, from, recipient);
            return;
        }
        self.send_frame(&recipient, &RelayFrame::Signal(msg));
    }

    pub fn send_frame(&self, peer_id: &PeerId, frame: &RelayFrame) {
        let Some(peer) = self.inner.peers.get(peer_id) else {
            warn!("Attempted to send to disconnected peer {}", peer_id);
            return;
        };
        match serde_json::to_string(frame) {
            Ok(json) => {
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!("Failed to queue frame for {}: {}", peer_id, e);
                }
            }
            Err(e) => error!("Failed to serialize relay frame: {}", e),
        }
    }
}
