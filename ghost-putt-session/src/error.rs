use ghost_putt_core::{InvalidRoomCode, PeerId};
use thiserror::Error;

/// Failures the session layer reports to its callers.
///
/// `SignalingUnavailable` and `PeerUnreachable` are returned from create/join
/// so the UI can retry. `LinkError` and `MalformedMessage` are contained
/// inside the manager and only show up in logs and session events.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("signaling relay unavailable: {0}")]
    SignalingUnavailable(String),

    #[error("peer {peer_id} did not respond: {reason}")]
    PeerUnreachable { peer_id: PeerId, reason: String },

    #[error("link to {peer_id} failed: {reason}")]
    LinkError { peer_id: PeerId, reason: String },

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error(transparent)]
    InvalidRoomCode(#[from] InvalidRoomCode),

    #[error("peer manager is no longer running")]
    ManagerClosed,
}

impl SessionError {
    pub(crate) fn unreachable(peer_id: &PeerId, reason: impl Into<String>) -> Self {
        Self::PeerUnreachable {
            peer_id: peer_id.clone(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::SignalingUnavailable(_) | SessionError::PeerUnreachable { .. }
        )
    }
}
