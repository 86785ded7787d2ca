use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    RoomJoin,
    RoomLeave,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
            SignalKind::RoomJoin => "room-join",
            SignalKind::RoomLeave => "room-leave",
        };
        f.write_str(name)
    }
}

/// Connection-setup message exchanged through the relay before a direct link
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalingMessage {
    pub kind: SignalKind,
    pub room_code: String,
    #[serde(default)]
    pub payload: Value,
    pub from_peer_id: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_peer_id: Option<PeerId>,
}

impl SignalingMessage {
    pub fn new(kind: SignalKind, room_code: impl Into<String>, from: PeerId) -> Self {
        Self {
            kind,
            room_code: room_code.into(),
            payload: Value::Null,
            from_peer_id: from,
            to_peer_id: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn to(mut self, peer_id: PeerId) -> Self {
        self.to_peer_id = Some(peer_id);
        self
    }
}

/// Frames spoken between a client and the relay service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum RelayFrame {
    Register {
        peer_id: Option<PeerId>,
    },
    Welcome {
        peer_id: PeerId,
    },
    Signal(SignalingMessage),
    Error {
        reason: String,
    },
}
