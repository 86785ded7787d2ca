use crate::error::SessionError;
use crate::signaling::relay::{RelaySession, SignalingRelay};
use ghost_putt_core::{PeerId, RoomCode, SessionRole, SignalKind, SignalingMessage};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

pub type SignalHandler = Box<dyn Fn(SignalingMessage) + Send + Sync>;

struct RoomBinding {
    code: RoomCode,
    role: SessionRole,
}

/// Rendezvous side of a session: one relay identity, one room binding and a
/// handler per signaling kind.
pub struct SignalingChannel {
    relay: Arc<dyn SignalingRelay>,
    signaling_timeout: Duration,
    handshake_timeout: Duration,
    session: Option<RelaySession>,
    room: Option<RoomBinding>,
    handlers: HashMap<SignalKind, SignalHandler>,
    known_peers: HashSet<PeerId>,
}

impl SignalingChannel {
    pub fn new(
        relay: Arc<dyn SignalingRelay>,
        signaling_timeout: Duration,
        handshake_timeout: Duration,
    ) -> Self {
        Self {
            relay,
            signaling_timeout,
            handshake_timeout,
            session: None,
            room: None,
            handlers: HashMap::new(),
            known_peers: HashSet::new(),
        }
    }

    pub fn peer_id(&self) -> Option<&PeerId> {
        self.session.as_ref().map(|s| &s.peer_id)
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.room.as_ref().map(|r| &r.code)
    }

    pub fn role(&self) -> Option<SessionRole> {
        self.room.as_ref().map(|r| r.role)
    }

    pub fn known_peers(&self) -> impl Iterator<Item = &PeerId> {
        self.known_peers.iter()
    }

    /// Obtains an identity from the relay, or returns the one already held.
    pub async fn initialize(&mut self, requested: Option<PeerId>) -> Result<PeerId, SessionError> {
        if let Some(session) = &self.session {
            return Ok(session.peer_id.clone());
        }

        let session = match timeout(self.signaling_timeout, self.relay.connect(requested)).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => return Err(SessionError::SignalingUnavailable(format!("{e:#}"))),
            Err(_) => {
                return Err(SessionError::SignalingUnavailable(format!(
                    "no identity within {:?}",
                    self.signaling_timeout
                )));
            }
        };

        let peer_id = session.peer_id.clone();
        info!("Signaling identity {}", peer_id);
        self.session = Some(session);
        Ok(peer_id)
    }

    /// Binds the local identity to `code` as host. Does not wait for joiners.
    pub async fn create_room(&mut self, code: &RoomCode) -> Result<(), SessionError> {
        self.initialize(None).await?;
        self.room = Some(RoomBinding {
            code: code.clone(),
            role: SessionRole::Host,
        });
        info!("Hosting room {}", code.display());
        Ok(())
    }

    /// Announces ourselves to `host` and waits for its acknowledgement.
    /// Messages from other peers that arrive meanwhile are dispatched as
    /// usual.
    pub async fn join_room(&mut self, code: &RoomCode, host: &PeerId) -> Result<(), SessionError> {
        let local = self.initialize(None).await?;
        self.room = Some(RoomBinding {
            code: code.clone(),
            role: SessionRole::Joiner,
        });
        self.known_peers.insert(host.clone());

        self.send(SignalingMessage::new(SignalKind::RoomJoin, code.as_str(), local).to(host.clone()));

        let deadline = Instant::now() + self.handshake_timeout;
        loop {
            let Some(session) = self.session.as_mut() else {
                return Err(SessionError::unreachable(host, "signaling closed"));
            };
            let msg = match timeout_at(deadline, session.inbound.recv()).await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    self.session = None;
                    return Err(SessionError::SignalingUnavailable(
                        "relay connection lost".into(),
                    ));
                }
                Err(_) => {
                    return Err(SessionError::unreachable(
                        host,
                        format!("no answer within {:?}", self.handshake_timeout),
                    ));
                }
            };

            if &msg.from_peer_id != host {
                self.handle_message(msg);
                continue;
            }

            match msg.kind {
                SignalKind::RoomJoin => {
                    info!("Host {} accepted us into {}", host, code.display());
                    return Ok(());
                }
                SignalKind::RoomLeave => {
                    return Err(SessionError::unreachable(host, "host rejected the room code"));
                }
                _ => {
                    self.handle_message(msg);
                    return Ok(());
                }
            }
        }
    }

    /// Fire-and-forget. Without a recipient the message goes to every peer
    /// this channel knows about.
    pub fn send(&self, msg: SignalingMessage) {
        let Some(session) = &self.session else {
            warn!("Dropping {}: signaling not initialized", msg.kind);
            return;
        };

        if msg.to_peer_id.is_some() {
            let _ = session.outbound.send(msg);
            return;
        }

        for peer in &self.known_peers {
            let _ = session.outbound.send(msg.clone().to(peer.clone()));
        }
    }

    /// Drops `peer` from the broadcast set once its link is gone.
    pub fn forget_peer(&mut self, peer: &PeerId) {
        if self.known_peers.remove(peer) {
            debug!("Forgot signaling peer {}", peer);
        }
    }

    /// Registers the handler for `kind`, replacing any earlier one.
    pub fn on_message<F>(&mut self, kind: SignalKind, handler: F)
    where
        F: Fn(SignalingMessage) + Send + Sync + 'static,
    {
        if self.handlers.insert(kind, Box::new(handler)).is_some() {
            debug!("Replaced {} handler", kind);
        }
    }

    /// Next inbound message. Pends forever while no relay session is open,
    /// so it can sit in a `select!` unconditionally.
    pub async fn recv(&mut self) -> Option<SignalingMessage> {
        match self.session.as_mut() {
            Some(session) => session.inbound.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Records the sender, answers room joins when hosting, then hands the
    /// message to the handler registered for its kind.
    pub fn handle_message(&mut self, msg: SignalingMessage) {
        self.known_peers.insert(msg.from_peer_id.clone());

        if msg.kind == SignalKind::RoomJoin {
            self.answer_room_join(&msg);
        }
        if msg.kind == SignalKind::RoomLeave {
            self.known_peers.remove(&msg.from_peer_id);
        }

        match self.handlers.get(&msg.kind) {
            Some(handler) => handler(msg),
            None => debug!("No handler for {} from {}", msg.kind, msg.from_peer_id),
        }
    }

    fn answer_room_join(&self, msg: &SignalingMessage) {
        let (Some(room), Some(local)) = (&self.room, self.peer_id()) else {
            return;
        };
        if room.role != SessionRole::Host {
            return;
        }

        let accepted = msg.room_code == room.code.as_str();
        let kind = if accepted {
            SignalKind::RoomJoin
        } else {
            warn!(
                "{} asked for room {} but we host {}",
                msg.from_peer_id,
                msg.room_code,
                room.code.as_str()
            );
            SignalKind::RoomLeave
        };

        self.send(
            SignalingMessage::new(kind, room.code.as_str(), local.clone())
                .with_payload(json!({ "accepted": accepted }))
                .to(msg.from_peer_id.clone()),
        );
    }

    /// The relay went away underneath us.
    pub fn mark_lost(&mut self) {
        if self.session.take().is_some() {
            warn!("Lost relay connection");
        }
    }

    /// Releases the identity and forgets the room, handlers and peers. Safe
    /// to call repeatedly.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            info!("Releasing signaling identity {}", session.peer_id);
        }
        self.room = None;
        self.handlers.clear();
        self.known_peers.clear();
    }
}
