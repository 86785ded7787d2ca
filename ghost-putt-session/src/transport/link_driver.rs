use crate::transport::transport_event::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use ghost_putt_core::{PeerId, SignalKind};
use serde_json::Value;
use tokio::sync::mpsc;

/// One direct connection to a remote peer, as seen by the transport.
#[async_trait]
pub trait LinkDriver: Send + Sync {
    /// Feed a handshake payload received through signaling.
    async fn apply_signal(&self, kind: SignalKind, payload: Value) -> Result<()>;

    async fn send(&self, data: Bytes) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds [`LinkDriver`]s. Everything the driver observes is reported on
/// `events`, tagged with the remote peer id.
#[async_trait]
pub trait LinkConnector: Send + Sync {
    async fn connect(
        &self,
        local: &PeerId,
        remote: &PeerId,
        initiator: bool,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn LinkDriver>>;
}
