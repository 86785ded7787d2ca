use crate::transport::link_driver::{LinkConnector, LinkDriver};
use crate::transport::transport_event::TransportEvent;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use ghost_putt_core::{IceServerConfig, PeerId, SignalKind};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

pub const DATA_CHANNEL_LABEL: &str = "ghost-putt";

type ChannelSlot = Arc<Mutex<Option<Arc<RTCDataChannel>>>>;

/// Opens real WebRTC data channels, trickling ICE candidates through
/// signaling.
#[derive(Clone)]
pub struct WebRtcConnector {
    ice_servers: Vec<IceServerConfig>,
}

impl WebRtcConnector {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }

    fn rtc_configuration(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl LinkConnector for WebRtcConnector {
    async fn connect(
        &self,
        _local: &PeerId,
        remote: &PeerId,
        initiator: bool,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn LinkDriver>> {
        let mut media = MediaEngine::default();
        media.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media)?;
        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let peer_connection = Arc::new(
            api.new_peer_connection(self.rtc_configuration())
                .await
                .context("Failed to create peer connection")?,
        );
        let channel: ChannelSlot = Arc::new(Mutex::new(None));

        let state_tx = events.clone();
        let state_peer = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let peer = state_peer.clone();
                Box::pin(async move {
                    info!("Connection to {} is {:?}", peer, s);
                    if let Some(event) = state_event(peer, s) {
                        let _ = tx.send(event);
                    }
                })
            },
        ));

        let ice_tx = events.clone();
        let ice_peer = remote.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let peer = ice_peer.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else { return };
                let Ok(payload) = serde_json::to_value(&init) else {
                    return;
                };
                let _ = tx.send(TransportEvent::Signal(peer, SignalKind::IceCandidate, payload));
            })
        }));

        if initiator {
            let dc = peer_connection
                .create_data_channel(DATA_CHANNEL_LABEL, None)
                .await
                .context("Failed to create data channel")?;
            wire_channel(dc, remote.clone(), events.clone(), channel.clone());

            let offer = peer_connection.create_offer(None).await?;
            peer_connection.set_local_description(offer.clone()).await?;
            events.send(TransportEvent::Signal(
                remote.clone(),
                SignalKind::Offer,
                serde_json::to_value(&offer)?,
            ))?;
        } else {
            let dc_tx = events.clone();
            let dc_peer = remote.clone();
            let dc_slot = channel.clone();
            peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
                let tx = dc_tx.clone();
                let peer = dc_peer.clone();
                let slot = dc_slot.clone();
                Box::pin(async move {
                    debug!("Remote opened data channel '{}' from {}", dc.label(), peer);
                    wire_channel(dc, peer, tx, slot);
                })
            }));
        }

        Ok(Box::new(WebRtcLink {
            remote: remote.clone(),
            peer_connection,
            channel,
            events,
        }))
    }
}

/// `Disconnected` is left alone: ICE may still recover, and a dead path ends
/// in `Failed`.
fn state_event(peer: PeerId, state: RTCPeerConnectionState) -> Option<TransportEvent> {
    match state {
        RTCPeerConnectionState::Failed => Some(TransportEvent::Failed(peer, "ICE failed".into())),
        RTCPeerConnectionState::Closed => Some(TransportEvent::Closed(peer)),
        _ => None,
    }
}

/// The channel only becomes writable once `on_open` fires, so it is parked
/// in `slot` from there.
fn wire_channel(
    dc: Arc<RTCDataChannel>,
    peer: PeerId,
    events: mpsc::UnboundedSender<TransportEvent>,
    slot: ChannelSlot,
) {
    let open_dc = dc.clone();
    let open_tx = events.clone();
    let open_peer = peer.clone();
    dc.on_open(Box::new(move || {
        Box::pin(async move {
            info!("Data channel to {} open", open_peer);
            *slot.lock().await = Some(open_dc);
            let _ = open_tx.send(TransportEvent::Open(open_peer));
        })
    }));

    let msg_tx = events.clone();
    let msg_peer = peer.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = msg_tx.clone();
        let peer = msg_peer.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::Message(peer, msg.data));
        })
    }));

    dc.on_close(Box::new(move || {
        let tx = events.clone();
        let peer = peer.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::Closed(peer));
        })
    }));
}

struct WebRtcLink {
    remote: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
    channel: ChannelSlot,
    events: mpsc::UnboundedSender<TransportEvent>,
}

#[async_trait]
impl LinkDriver for WebRtcLink {
    async fn apply_signal(&self, kind: SignalKind, payload: Value) -> Result<()> {
        match kind {
            SignalKind::Offer => {
                let offer: RTCSessionDescription =
                    serde_json::from_value(payload).context("Failed to parse SDP offer")?;
                self.peer_connection.set_remote_description(offer).await?;
                let answer = self.peer_connection.create_answer(None).await?;
                self.peer_connection
                    .set_local_description(answer.clone())
                    .await?;
                self.events.send(TransportEvent::Signal(
                    self.remote.clone(),
                    SignalKind::Answer,
                    serde_json::to_value(&answer)?,
                ))?;
            }
            SignalKind::Answer => {
                let answer: RTCSessionDescription =
                    serde_json::from_value(payload).context("Failed to parse SDP answer")?;
                self.peer_connection.set_remote_description(answer).await?;
            }
            SignalKind::IceCandidate => {
                let candidate: RTCIceCandidateInit =
                    serde_json::from_value(payload).context("Failed to parse ICE candidate")?;
                self.peer_connection.add_ice_candidate(candidate).await?;
            }
            other => bail!("{} is not a link signal", other),
        }
        Ok(())
    }

    async fn send(&self, data: Bytes) -> Result<()> {
        let guard = self.channel.lock().await;
        let Some(dc) = guard.as_ref() else {
            bail!("data channel to {} is not open", self.remote);
        };
        dc.send(&data).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.channel.lock().await.take();
        self.peer_connection.close().await?;
        Ok(())
    }
}
