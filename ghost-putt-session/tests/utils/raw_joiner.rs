use anyhow::{Result, bail};
use bytes::Bytes;
use ghost_putt_core::{PeerId, RoomCode, SignalKind, SignalingMessage};
use ghost_putt_session::{LinkConnector, LinkDriver, SignalingChannel, TransportEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::utils::TestNetwork;

/// A joiner driven by hand instead of by a peer manager, so tests can put
/// arbitrary bytes on the wire.
pub struct RawJoiner {
    pub id: PeerId,
    channel: SignalingChannel,
    driver: Box<dyn LinkDriver>,
}

impl RawJoiner {
    pub async fn connect(net: &TestNetwork, code: &RoomCode, host: &PeerId) -> Result<Self> {
        let mut channel = SignalingChannel::new(
            Arc::new(net.relay.clone()),
            Duration::from_millis(500),
            Duration::from_millis(2_000),
        );
        let id = channel.initialize(None).await?;
        channel.join_room(code, host).await?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let driver = net.network.connect(&id, host, true, tx).await?;

        let handshake = async {
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Some(TransportEvent::Signal(remote, kind, payload)) => {
                            channel.send(
                                SignalingMessage::new(kind, code.as_str(), id.clone())
                                    .with_payload(payload)
                                    .to(remote),
                            );
                        }
                        Some(TransportEvent::Open(_)) => return Ok(()),
                        other => bail!("unexpected transport event {:?}", other),
                    },
                    msg = channel.recv() => {
                        let Some(msg) = msg else { bail!("relay closed") };
                        if &msg.from_peer_id == host && msg.kind == SignalKind::Answer {
                            driver.apply_signal(msg.kind, msg.payload).await?;
                        }
                    }
                }
            }
        };
        timeout(Duration::from_secs(5), handshake).await??;

        Ok(Self {
            id,
            channel,
            driver,
        })
    }

    /// Sends another `room-join` to `host` over the same identity.
    pub fn repeat_room_join(&self, code: &RoomCode, host: &PeerId) {
        self.channel.send(
            SignalingMessage::new(SignalKind::RoomJoin, code.as_str(), self.id.clone())
                .to(host.clone()),
        );
    }

    pub async fn send_raw(&self, data: &'static [u8]) -> Result<()> {
        self.driver.send(Bytes::from_static(data)).await
    }

    pub async fn send_json(&self, json: String) -> Result<()> {
        self.driver.send(Bytes::from(json)).await
    }
}
