use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Game message kinds. Names the peer does not know are kept verbatim in
/// [`MessageKind::Unknown`] so they can be reported instead of failing the
/// whole frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    StateUpdate,
    GhostBallUpdate,
    ObstaclePlaced,
    PlayerJoined,
    PlayerLeft,
    ShotTaken,
    HoleCompleted,
    Unknown(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::StateUpdate => "state-update",
            MessageKind::GhostBallUpdate => "ghost-ball-update",
            MessageKind::ObstaclePlaced => "obstacle-placed",
            MessageKind::PlayerJoined => "player-joined",
            MessageKind::PlayerLeft => "player-left",
            MessageKind::ShotTaken => "shot-taken",
            MessageKind::HoleCompleted => "hole-completed",
            MessageKind::Unknown(name) => name,
        }
    }
}

impl From<String> for MessageKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "state-update" => MessageKind::StateUpdate,
            "ghost-ball-update" => MessageKind::GhostBallUpdate,
            "obstacle-placed" => MessageKind::ObstaclePlaced,
            "player-joined" => MessageKind::PlayerJoined,
            "player-left" => MessageKind::PlayerLeft,
            "shot-taken" => MessageKind::ShotTaken,
            "hole-completed" => MessageKind::HoleCompleted,
            _ => MessageKind::Unknown(name),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Unknown(name) => name,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire envelope carried over data channels as JSON text.
///
/// `timestamp` is informative only; nothing orders messages by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMessage {
    #[serde(rename = "type", alias = "kind")]
    pub kind: MessageKind,
    #[serde(default)]
    pub payload: Value,
    pub timestamp: u64,
    pub from_player_id: String,
}

impl GameMessage {
    pub fn new(kind: MessageKind, payload: Value, from_player_id: impl Into<String>) -> Self {
        Self {
            kind,
            payload,
            timestamp: now_millis(),
            from_player_id: from_player_id.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}

/// Milliseconds since the Unix epoch; zero if the clock is before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
