use crate::transport::link_driver::{LinkConnector, LinkDriver};
use crate::transport::transport_event::TransportEvent;
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use ghost_putt_core::{PeerId, SignalKind};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

struct Endpoint {
    events: mpsc::UnboundedSender<TransportEvent>,
    open: bool,
}

type EndpointKey = (PeerId, PeerId);

/// In-process stand-in for a data-channel network. Links still go through a
/// full offer/answer exchange over signaling; only the media path is a
/// channel instead of a socket.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    endpoints: Arc<DashMap<EndpointKey, Endpoint>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Breaks the link between `a` and `b`, reporting a failure on both
    /// ends.
    pub fn sever(&self, a: &PeerId, b: &PeerId) {
        for (local, remote) in [(a, b), (b, a)] {
            if let Some((_, endpoint)) = self.endpoints.remove(&(local.clone(), remote.clone())) {
                let _ = endpoint
                    .events
                    .send(TransportEvent::Failed(remote.clone(), "link severed".into()));
            }
        }
    }

    pub fn is_open(&self, local: &PeerId, remote: &PeerId) -> bool {
        self.endpoints
            .get(&(local.clone(), remote.clone()))
            .is_some_and(|e| e.open)
    }
}

#[async_trait]
impl LinkConnector for MemoryNetwork {
    async fn connect(
        &self,
        local: &PeerId,
        remote: &PeerId,
        initiator: bool,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn LinkDriver>> {
        self.endpoints.insert(
            (local.clone(), remote.clone()),
            Endpoint {
                events: events.clone(),
                open: false,
            },
        );

        if initiator {
            let offer = json!({ "type": "offer", "sdp": format!("memory:{local}") });
            events.send(TransportEvent::Signal(remote.clone(), SignalKind::Offer, offer))?;
        }

        Ok(Box::new(MemoryLink {
            network: self.clone(),
            local: local.clone(),
            remote: remote.clone(),
            initiator,
        }))
    }
}

struct MemoryLink {
    network: MemoryNetwork,
    local: PeerId,
    remote: PeerId,
    initiator: bool,
}

impl MemoryLink {
    fn own_key(&self) -> EndpointKey {
        (self.local.clone(), self.remote.clone())
    }

    fn remote_key(&self) -> EndpointKey {
        (self.remote.clone(), self.local.clone())
    }

    fn emit_local(&self, event: TransportEvent) -> Result<()> {
        let endpoint = self
            .network
            .endpoints
            .get(&self.own_key())
            .ok_or_else(|| anyhow!("link to {} already closed", self.remote))?;
        endpoint.events.send(event)?;
        Ok(())
    }

    fn open_both_ends(&self) -> Result<()> {
        let mut remote = self
            .network
            .endpoints
            .get_mut(&self.remote_key())
            .ok_or_else(|| anyhow!("{} has no endpoint for us", self.remote))?;
        remote.open = true;
        remote.events.send(TransportEvent::Open(self.local.clone()))?;
        drop(remote);

        let mut own = self
            .network
            .endpoints
            .get_mut(&self.own_key())
            .ok_or_else(|| anyhow!("link to {} already closed", self.remote))?;
        own.open = true;
        own.events.send(TransportEvent::Open(self.remote.clone()))?;
        Ok(())
    }
}

#[async_trait]
impl LinkDriver for MemoryLink {
    async fn apply_signal(&self, kind: SignalKind, _payload: Value) -> Result<()> {
        match (self.initiator, kind) {
            (false, SignalKind::Offer) => {
                let answer = json!({ "type": "answer", "sdp": format!("memory:{}", self.local) });
                self.emit_local(TransportEvent::Signal(
                    self.remote.clone(),
                    SignalKind::Answer,
                    answer,
                ))
            }
            (true, SignalKind::Answer) => self.open_both_ends(),
            (_, SignalKind::IceCandidate) => Ok(()),
            (_, other) => bail!("unexpected {} for this side of the link", other),
        }
    }

    async fn send(&self, data: Bytes) -> Result<()> {
        if !self.network.is_open(&self.local, &self.remote) {
            bail!("link to {} is not open", self.remote);
        }
        let remote = self
            .network
            .endpoints
            .get(&self.remote_key())
            .ok_or_else(|| anyhow!("{} went away", self.remote))?;
        remote
            .events
            .send(TransportEvent::Message(self.local.clone(), data))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.network.endpoints.remove(&self.own_key()).is_none() {
            return Ok(());
        }
        if let Some((_, remote)) = self.network.endpoints.remove(&self.remote_key()) {
            debug!("Closing memory link {} -> {}", self.local, self.remote);
            let _ = remote.events.send(TransportEvent::Closed(self.local.clone()));
        }
        Ok(())
    }
}
