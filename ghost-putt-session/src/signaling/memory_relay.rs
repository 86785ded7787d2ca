use crate::signaling::relay::{RelaySession, SignalingRelay};
use anyhow::{Result, bail};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ghost_putt_core::{PeerId, SignalingMessage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct MemoryRelayInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<SignalingMessage>>,
    available: AtomicBool,
}

/// Relay living inside the process. Every clone shares the same registry, so
/// several sessions built from clones can find each other.
#[derive(Clone)]
pub struct MemoryRelay {
    inner: Arc<MemoryRelayInner>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryRelayInner {
                peers: DashMap::new(),
                available: AtomicBool::new(true),
            }),
        }
    }

    /// While unavailable, new registrations fail. Existing sessions keep
    /// working.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    pub fn is_registered(&self, peer_id: &PeerId) -> bool {
        self.inner.peers.contains_key(peer_id)
    }

    pub fn registered_count(&self) -> usize {
        self.inner.peers.len()
    }

    fn route(inner: &MemoryRelayInner, from: &PeerId, mut msg: SignalingMessage) {
        msg.from_peer_id = from.clone();

        let Some(recipient) = msg.to_peer_id.clone() else {
            warn!("Dropping {} from {} without recipient", msg.kind, from);
            return;
        };

        match inner.peers.get(&recipient) {
            Some(tx) => {
                if tx.send(msg).is_err() {
                    debug!("Recipient {} is shutting down", recipient);
                }
            }
            None => warn!("Dropping {} from {}: {} is not registered", msg.kind, from, recipient),
        }
    }
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingRelay for MemoryRelay {
    async fn connect(&self, requested: Option<PeerId>) -> Result<RelaySession> {
        if !self.inner.available.load(Ordering::SeqCst) {
            bail!("memory relay is offline");
        }

        let peer_id = requested.unwrap_or_default();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        match self.inner.peers.entry(peer_id.clone()) {
            Entry::Occupied(_) => bail!("peer id {} is already registered", peer_id),
            Entry::Vacant(slot) => {
                slot.insert(inbound_tx);
            }
        }

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<SignalingMessage>();
        let inner = self.inner.clone();
        let sender = peer_id.clone();

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                Self::route(&inner, &sender, msg);
            }
            inner.peers.remove(&sender);
            debug!("Released relay identity {}", sender);
        });

        Ok(RelaySession {
            peer_id,
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
