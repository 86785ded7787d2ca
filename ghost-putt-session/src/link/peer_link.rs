use crate::error::SessionError;
use crate::link::link_state::{LinkEvent, LinkState, transition};
use crate::transport::{LinkDriver, TransportEvent};
use anyhow::{Result, bail};
use bytes::Bytes;
use ghost_putt_core::{GameMessage, PeerId, SignalKind, SignalingMessage};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One direct connection to a remote peer, owned by the peer manager.
pub struct PeerLink {
    remote: PeerId,
    initiator: bool,
    state: LinkState,
    driver: Option<Box<dyn LinkDriver>>,
    deadline: Option<JoinHandle<()>>,
}

impl PeerLink {
    pub fn new(remote: PeerId, initiator: bool) -> Self {
        Self {
            remote,
            initiator,
            state: LinkState::Connecting,
            driver: None,
            deadline: None,
        }
    }

    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    pub fn attach(&mut self, driver: Box<dyn LinkDriver>) {
        self.driver = Some(driver);
    }

    /// Reports a failure on `events` if the link is still connecting after
    /// `after`.
    pub fn arm_deadline(&mut self, after: Duration, events: mpsc::UnboundedSender<TransportEvent>) {
        let remote = self.remote.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(TransportEvent::Failed(
                remote,
                format!("not connected within {after:?}"),
            ));
        });
        if let Some(old) = self.deadline.replace(handle) {
            old.abort();
        }
    }

    fn disarm_deadline(&mut self) {
        if let Some(handle) = self.deadline.take() {
            handle.abort();
        }
    }

    /// Handshake kinds this side expects from the remote.
    pub fn expected_kinds(&self) -> [SignalKind; 2] {
        if self.initiator {
            [SignalKind::Answer, SignalKind::IceCandidate]
        } else {
            [SignalKind::Offer, SignalKind::IceCandidate]
        }
    }

    pub fn accepts(&self, msg: &SignalingMessage) -> bool {
        self.state != LinkState::Closed
            && msg.from_peer_id == self.remote
            && self.expected_kinds().contains(&msg.kind)
    }

    pub async fn apply_signal(&self, kind: SignalKind, payload: Value) -> Result<()> {
        let Some(driver) = &self.driver else {
            bail!("link to {} has no transport", self.remote);
        };
        driver.apply_signal(kind, payload).await
    }

    /// Feeds `event` through the state machine. Returns the new state, or
    /// `None` when the event did not apply.
    pub fn apply(&mut self, event: LinkEvent) -> Option<LinkState> {
        let next = transition(self.state, event)?;
        debug!("Link {}: {} -> {} on {:?}", self.remote, self.state, next, event);
        self.state = next;
        if next != LinkState::Connecting {
            self.disarm_deadline();
        }
        Some(next)
    }

    pub fn decode(&self, frame: &[u8]) -> Result<GameMessage, SessionError> {
        GameMessage::from_slice(frame).map_err(|e| SessionError::MalformedMessage(e.to_string()))
    }

    pub async fn send(&self, frame: Bytes) -> Result<(), SessionError> {
        let link_error = |reason: String| SessionError::LinkError {
            peer_id: self.remote.clone(),
            reason,
        };

        if !self.is_connected() {
            return Err(link_error(format!("link is {}", self.state)));
        }
        let Some(driver) = &self.driver else {
            return Err(link_error("no transport".into()));
        };
        driver.send(frame).await.map_err(|e| link_error(format!("{e:#}")))
    }

    /// `error` followed by cleanup. Returns false if the link was already
    /// closed or failed.
    pub async fn fail(&mut self, reason: &str) -> bool {
        if self.apply(LinkEvent::Failed).is_none() {
            return false;
        }
        warn!("Link to {} failed: {}", self.remote, reason);
        self.release().await;
        self.apply(LinkEvent::CleanedUp);
        true
    }

    pub async fn remote_closed(&mut self) -> bool {
        if self.apply(LinkEvent::RemoteClosed).is_none() {
            return false;
        }
        self.release().await;
        true
    }

    /// Local teardown. Safe to call on a link in any state.
    pub async fn destroy(&mut self) {
        self.apply(LinkEvent::Destroyed);
        self.disarm_deadline();
        self.release().await;
    }

    async fn release(&mut self) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.close().await {
                debug!("Closing transport to {}: {:#}", self.remote, e);
            }
        }
    }
}

impl Drop for PeerLink {
    fn drop(&mut self) {
        self.disarm_deadline();
    }
}
