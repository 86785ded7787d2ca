use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::link::{LinkEvent, LinkState, PeerLink};
use crate::manager::manager_command::{ManagerCommand, Reply};
use crate::manager::manager_handle::PeerManagerHandle;
use crate::manager::session_event::SessionEvent;
use crate::protocol::MessageProtocol;
use crate::signaling::{SignalingChannel, SignalingRelay, WsRelay};
use crate::transport::{LinkConnector, TransportEvent, WebRtcConnector};
use bytes::Bytes;
use ghost_putt_core::{
    GameMessage, MessageKind, PeerId, RoomCode, SessionRole, SessionState, SignalKind,
    SignalingMessage,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

const COMMAND_CAPACITY: usize = 100;

const ROUTED_KINDS: [SignalKind; 5] = [
    SignalKind::Offer,
    SignalKind::Answer,
    SignalKind::IceCandidate,
    SignalKind::RoomJoin,
    SignalKind::RoomLeave,
];

struct PendingJoin {
    host: PeerId,
    reply: Reply<Result<PeerId, SessionError>>,
}

/// Event loop owning the signaling channel and every [`PeerLink`] of one
/// session. All mutation happens on this task.
pub struct PeerManager {
    config: SessionConfig,
    signaling: SignalingChannel,
    connector: Arc<dyn LinkConnector>,
    links: HashMap<PeerId, PeerLink>,
    protocol: Option<MessageProtocol>,
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
    command_rx: mpsc::Receiver<ManagerCommand>,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    routed_tx: mpsc::UnboundedSender<SignalingMessage>,
    routed_rx: mpsc::UnboundedReceiver<SignalingMessage>,
    pending_join: Option<PendingJoin>,
    broadcast_timer: Option<Interval>,
}

impl PeerManager {
    pub fn new(
        config: SessionConfig,
        relay: Arc<dyn SignalingRelay>,
        connector: Arc<dyn LinkConnector>,
    ) -> (Self, PeerManagerHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (routed_tx, routed_rx) = mpsc::unbounded_channel();
        let state = Arc::new(RwLock::new(SessionState::default()));

        let signaling = SignalingChannel::new(
            relay,
            config.signaling_timeout(),
            config.handshake_timeout(),
        );
        let handle = PeerManagerHandle::new(command_tx, events.clone(), state.clone());

        let manager = Self {
            config,
            signaling,
            connector,
            links: HashMap::new(),
            protocol: None,
            state,
            events,
            command_rx,
            transport_tx,
            transport_rx,
            routed_tx,
            routed_rx,
            pending_join: None,
            broadcast_timer: None,
        };
        (manager, handle)
    }

    /// Starts the loop on the current runtime.
    pub fn spawn(
        config: SessionConfig,
        relay: Arc<dyn SignalingRelay>,
        connector: Arc<dyn LinkConnector>,
    ) -> PeerManagerHandle {
        let (manager, handle) = Self::new(config, relay, connector);
        tokio::spawn(manager.run());
        handle
    }

    /// WebSocket relay and WebRTC data channels, both taken from `config`.
    pub fn spawn_networked(config: SessionConfig) -> PeerManagerHandle {
        let relay = Arc::new(WsRelay::new(config.relay_url.clone()));
        let connector = Arc::new(WebRtcConnector::new(config.ice_servers.clone()));
        Self::spawn(config, relay, connector)
    }

    pub async fn run(mut self) {
        info!("Peer manager started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All handles dropped. Shutting down peer manager.");
                            break;
                        }
                    }
                }

                Some(event) = self.transport_rx.recv() => {
                    self.handle_transport_event(event).await;
                }

                incoming = self.signaling.recv() => {
                    match incoming {
                        Some(msg) => self.signaling.handle_message(msg),
                        None => self.signaling.mark_lost(),
                    }
                }

                Some(msg) = self.routed_rx.recv() => {
                    self.route_signal(msg).await;
                }

                _ = next_tick(&mut self.broadcast_timer) => {
                    self.broadcast_state().await;
                }
            }
        }

        self.teardown().await;
        info!("Peer manager finished");
    }

    async fn handle_command(&mut self, cmd: ManagerCommand) {
        match cmd {
            ManagerCommand::CreateHost { code, reply } => {
                let result = self.create_host(code).await;
                let _ = reply.send(result);
            }

            ManagerCommand::Join { code, host, reply } => self.join(code, host, reply).await,

            ManagerCommand::Broadcast { message } => self.broadcast(&message).await,

            ManagerCommand::SendToPeer { peer_id, message } => {
                self.send_to_peer(&peer_id, &message).await;
            }

            ManagerCommand::Disconnect { reply } => {
                self.teardown().await;
                let _ = reply.send(());
            }

            ManagerCommand::ConnectedPeers { reply } => {
                let _ = reply.send(self.connected_peers());
            }

            ManagerCommand::LocalPeerId { reply } => {
                let _ = reply.send(self.signaling.peer_id().cloned());
            }
        }
    }

    async fn create_host(&mut self, code: RoomCode) -> Result<PeerId, SessionError> {
        self.teardown().await;
        *self.state.write().await = SessionState::default();

        if let Err(e) = self.signaling.create_room(&code).await {
            self.signaling.disconnect();
            return Err(e);
        }
        self.register_handlers();
        self.protocol = Some(MessageProtocol::new(SessionRole::Host));

        let local = self
            .signaling
            .peer_id()
            .cloned()
            .ok_or_else(|| SessionError::SignalingUnavailable("identity lost".into()))?;
        info!("Hosting {} as {}", code.display(), local);
        Ok(local)
    }

    async fn join(
        &mut self,
        code: RoomCode,
        host: PeerId,
        reply: Reply<Result<PeerId, SessionError>>,
    ) {
        self.teardown().await;
        *self.state.write().await = SessionState::default();

        if let Err(e) = self.signaling.initialize(None).await {
            let _ = reply.send(Err(e));
            return;
        }
        self.register_handlers();

        if let Err(e) = self.signaling.join_room(&code, &host).await {
            warn!("Joining {} via {} failed: {}", code.display(), host, e);
            self.signaling.disconnect();
            let _ = reply.send(Err(e));
            return;
        }

        self.protocol = Some(MessageProtocol::new(SessionRole::Joiner));
        self.pending_join = Some(PendingJoin {
            host: host.clone(),
            reply,
        });
        self.open_link(host, true).await;
    }

    /// Every routed kind lands on `routed_rx`; links are picked there by
    /// sender.
    fn register_handlers(&mut self) {
        for kind in ROUTED_KINDS {
            let tx = self.routed_tx.clone();
            self.signaling.on_message(kind, move |msg| {
                let _ = tx.send(msg);
            });
        }
    }

    fn role(&self) -> Option<SessionRole> {
        self.protocol.as_ref().map(MessageProtocol::role)
    }

    fn is_host(&self) -> bool {
        self.role() == Some(SessionRole::Host)
    }

    async fn route_signal(&mut self, msg: SignalingMessage) {
        let from = msg.from_peer_id.clone();

        match msg.kind {
            SignalKind::RoomJoin => {
                if !self.is_host() {
                    return;
                }
                let own_room = self.signaling.room_code().map(RoomCode::as_str);
                if own_room != Some(msg.room_code.as_str()) {
                    return;
                }
                if self.links.get(&from).is_some_and(|l| l.state() != LinkState::Closed) {
                    debug!("{} repeated its room-join; keeping the existing link", from);
                    return;
                }
                info!("{} asked to join", from);
                self.open_link(from, false).await;
            }

            SignalKind::RoomLeave => {
                info!("{} left the room", from);
                self.remove_link(&from).await;
            }

            SignalKind::Offer | SignalKind::Answer | SignalKind::IceCandidate => {
                if msg.kind == SignalKind::Offer && self.is_host() && !self.links.contains_key(&from)
                {
                    debug!("Offer from {} before its room-join", from);
                    self.open_link(from.clone(), false).await;
                }

                let Some(link) = self.links.get(&from) else {
                    debug!("No link for {} from {}", msg.kind, from);
                    return;
                };
                if !link.accepts(&msg) {
                    debug!("Link to {} does not take {}", from, msg.kind);
                    return;
                }

                let kind = msg.kind;
                let Err(e) = link.apply_signal(kind, msg.payload).await else {
                    return;
                };
                if kind == SignalKind::IceCandidate {
                    warn!("Failed to add ICE candidate from {}: {:#}", from, e);
                } else {
                    self.fail_link(&from, format!("{kind} rejected: {e:#}")).await;
                }
            }
        }
    }

    async fn open_link(&mut self, remote: PeerId, initiator: bool) {
        let Some(local) = self.signaling.peer_id().cloned() else {
            warn!("Cannot open link to {}: no signaling identity", remote);
            return;
        };

        if let Some(mut old) = self.links.remove(&remote) {
            info!("Replacing existing link to {}", remote);
            old.destroy().await;
        }

        let mut link = PeerLink::new(remote.clone(), initiator);
        link.arm_deadline(self.config.handshake_timeout(), self.transport_tx.clone());

        let connected = self
            .connector
            .connect(&local, &remote, initiator, self.transport_tx.clone())
            .await;
        let failure = match connected {
            Ok(driver) => {
                link.attach(driver);
                None
            }
            Err(e) => Some(format!("transport setup failed: {e:#}")),
        };

        self.links.insert(remote.clone(), link);
        if let Some(reason) = failure {
            self.fail_link(&remote, reason).await;
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Signal(remote, kind, payload) => {
                if !self.links.contains_key(&remote) {
                    return;
                }
                let (Some(local), Some(code)) =
                    (self.signaling.peer_id(), self.signaling.room_code())
                else {
                    return;
                };
                let msg = SignalingMessage::new(kind, code.as_str(), local.clone())
                    .with_payload(payload)
                    .to(remote);
                self.signaling.send(msg);
            }

            TransportEvent::Open(remote) => {
                let Some(link) = self.links.get_mut(&remote) else {
                    return;
                };
                if link.apply(LinkEvent::Opened) != Some(LinkState::Connected) {
                    return;
                }
                info!("Connected to {}", remote);
                self.emit(SessionEvent::PeerConnected(remote.clone()));
                self.resolve_join(&remote, Ok(()));
                self.refresh_timer();
            }

            TransportEvent::Message(remote, data) => self.handle_frame(remote, data).await,

            TransportEvent::Closed(remote) => {
                info!("Transport to {} closed", remote);
                self.remove_link(&remote).await;
            }

            TransportEvent::Failed(remote, reason) => self.fail_link(&remote, reason).await,
        }
    }

    async fn handle_frame(&mut self, remote: PeerId, data: Bytes) {
        let Some(link) = self.links.get(&remote) else {
            return;
        };
        if !link.is_connected() {
            debug!("Frame from {} before the link opened", remote);
            return;
        }
        let message = match link.decode(&data) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping frame from {}: {}", remote, e);
                return;
            }
        };
        let Some(protocol) = self.protocol else {
            return;
        };

        let outcome = {
            let mut state = self.state.write().await;
            protocol.dispatch(&mut state, &message)
        };
        debug!("{} from {}: {:?}", message.kind, remote, outcome);
        self.emit(SessionEvent::MessageDispatched {
            from: remote,
            message,
            outcome,
        });
    }

    /// Error transition, then removal. Duplicate reports are no-ops.
    async fn fail_link(&mut self, remote: &PeerId, reason: String) {
        let Some(link) = self.links.get_mut(remote) else {
            return;
        };
        if !link.fail(&reason).await {
            return;
        }
        self.links.remove(remote);
        self.signaling.forget_peer(remote);

        self.emit(SessionEvent::LinkFailed {
            peer_id: remote.clone(),
            reason: reason.clone(),
        });
        self.resolve_join(remote, Err(reason));
        self.refresh_timer();
    }

    async fn remove_link(&mut self, remote: &PeerId) {
        let Some(mut link) = self.links.remove(remote) else {
            return;
        };
        let was_connected = link.is_connected();
        link.remote_closed().await;
        self.signaling.forget_peer(remote);

        if was_connected {
            self.emit(SessionEvent::PeerDisconnected(remote.clone()));
        }
        self.resolve_join(remote, Err("link closed before it opened".into()));
        self.refresh_timer();
    }

    fn resolve_join(&mut self, remote: &PeerId, outcome: Result<(), String>) {
        if self.pending_join.as_ref().is_none_or(|p| &p.host != remote) {
            return;
        }
        let Some(pending) = self.pending_join.take() else {
            return;
        };

        let result = match (outcome, self.signaling.peer_id()) {
            (Ok(()), Some(local)) => Ok(local.clone()),
            (Ok(()), None) => Err(SessionError::SignalingUnavailable("identity lost".into())),
            (Err(reason), _) => Err(SessionError::unreachable(remote, reason)),
        };
        let _ = pending.reply.send(result);
    }

    pub fn connected_peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .links
            .values()
            .filter(|link| link.is_connected())
            .map(|link| link.remote().clone())
            .collect();
        peers.sort();
        peers
    }

    async fn broadcast(&self, message: &GameMessage) {
        let Some(frame) = encode_frame(message) else {
            return;
        };
        for link in self.links.values().filter(|l| l.is_connected()) {
            if let Err(e) = link.send(frame.clone()).await {
                warn!("Broadcast to {} failed: {}", link.remote(), e);
            }
        }
    }

    async fn send_to_peer(&self, peer_id: &PeerId, message: &GameMessage) {
        let Some(link) = self.links.get(peer_id).filter(|l| l.is_connected()) else {
            debug!("Not sending {} to {}: not connected", message.kind, peer_id);
            return;
        };
        let Some(frame) = encode_frame(message) else {
            return;
        };
        if let Err(e) = link.send(frame).await {
            warn!("Send to {} failed: {}", peer_id, e);
        }
    }

    async fn broadcast_state(&self) {
        let Some(local) = self.signaling.peer_id() else {
            return;
        };
        let snapshot = self.state.read().await.snapshot();
        let payload = match serde_json::to_value(&snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize state snapshot: {}", e);
                return;
            }
        };
        let message = MessageProtocol::encode(MessageKind::StateUpdate, payload, local.as_str());
        self.broadcast(&message).await;
    }

    /// The host ticks only while someone is connected.
    fn refresh_timer(&mut self) {
        let wanted = self.is_host() && self.links.values().any(PeerLink::is_connected);

        match (wanted, self.broadcast_timer.is_some()) {
            (true, false) => {
                let period = self.config.broadcast_interval();
                let mut timer = interval_at(Instant::now() + period, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.broadcast_timer = Some(timer);
                debug!("State broadcast every {:?}", period);
            }
            (false, true) => {
                self.broadcast_timer = None;
                debug!("State broadcast stopped");
            }
            _ => {}
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Leaves the room and releases everything. Safe to run repeatedly.
    async fn teardown(&mut self) {
        if let (Some(local), Some(code)) = (self.signaling.peer_id(), self.signaling.room_code()) {
            let leave = SignalingMessage::new(SignalKind::RoomLeave, code.as_str(), local.clone());
            self.signaling.send(leave);
        }

        self.broadcast_timer = None;

        for (remote, mut link) in self.links.drain() {
            let was_connected = link.is_connected();
            link.destroy().await;
            if was_connected {
                let _ = self.events.send(SessionEvent::PeerDisconnected(remote));
            }
        }

        if let Some(pending) = self.pending_join.take() {
            let _ = pending
                .reply
                .send(Err(SessionError::unreachable(&pending.host, "session closed")));
        }

        if self.signaling.peer_id().is_some() {
            info!("Session closed");
        }
        self.signaling.disconnect();
        self.protocol = None;

        while self.routed_rx.try_recv().is_ok() {}
        while self.transport_rx.try_recv().is_ok() {}
    }
}

fn encode_frame(message: &GameMessage) -> Option<Bytes> {
    match message.to_json() {
        Ok(json) => Some(Bytes::from(json)),
        Err(e) => {
            error!("Failed to serialize {}: {}", message.kind, e);
            None
        }
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
