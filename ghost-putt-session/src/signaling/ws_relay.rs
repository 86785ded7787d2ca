use crate::signaling::relay::{RelaySession, SignalingRelay};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use ghost_putt_core::{PeerId, RelayFrame, SignalingMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Client for the WebSocket relay service.
#[derive(Clone)]
pub struct WsRelay {
    url: String,
}

impl WsRelay {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn encode(frame: &RelayFrame) -> Result<Message> {
    let json = serde_json::to_string(frame).context("Failed to serialize relay frame")?;
    Ok(Message::Text(json))
}

#[async_trait]
impl SignalingRelay for WsRelay {
    async fn connect(&self, requested: Option<PeerId>) -> Result<RelaySession> {
        let (socket, _) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("Failed to reach relay at {}", self.url))?;
        let (mut sender, mut receiver) = socket.split();

        sender
            .send(encode(&RelayFrame::Register { peer_id: requested })?)
            .await
            .context("Failed to register with relay")?;

        let peer_id = loop {
            let msg = receiver
                .next()
                .await
                .ok_or_else(|| anyhow!("relay closed before assigning an identity"))?
                .context("Relay socket error")?;

            let Message::Text(text) = msg else {
                continue;
            };
            match serde_json::from_str::<RelayFrame>(&text) {
                Ok(RelayFrame::Welcome { peer_id }) => break peer_id,
                Ok(RelayFrame::Error { reason }) => bail!("relay refused registration: {reason}"),
                Ok(other) => debug!("Ignoring {:?} before welcome", other),
                Err(e) => warn!("Invalid frame from relay: {}", e),
            }
        };
        info!("Relay {} assigned identity {}", self.url, peer_id);

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<SignalingMessage>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<SignalingMessage>();

        let mut send_task = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let frame = match encode(&RelayFrame::Signal(msg)) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("{:#}", e);
                        continue;
                    }
                };
                if sender.send(frame).await.is_err() {
                    break;
                }
            }
            let _ = sender.send(Message::Close(None)).await;
        });

        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<RelayFrame>(&text) {
                        Ok(RelayFrame::Signal(signal)) => {
                            if inbound_tx.send(signal).is_err() {
                                break;
                            }
                        }
                        Ok(RelayFrame::Error { reason }) => warn!("Relay error: {}", reason),
                        Ok(other) => debug!("Ignoring relay frame {:?}", other),
                        Err(e) => warn!("Invalid frame from relay: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        });

        let label = peer_id.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = (&mut send_task) => recv_task.abort(),
                _ = (&mut recv_task) => send_task.abort(),
            };
            info!("Relay session {} closed", label);
        });

        Ok(RelaySession {
            peer_id,
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
