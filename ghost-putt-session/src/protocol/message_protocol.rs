use ghost_putt_core::{
    GameMessage, GhostBallUpdate, HoleCompleted, MessageKind, Player, PlayerLeft, PlayerObstacle,
    SessionRole, SessionState, ShotTaken, StateUpdate, now_millis,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// What [`MessageProtocol::dispatch`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The state changed.
    Applied,
    /// Valid, but nothing to do for this role or state.
    Ignored,
    /// Known kind with a payload that does not decode.
    Malformed,
    Unknown,
}

/// Maps game message kinds onto [`SessionState`] mutations for one role.
#[derive(Debug, Clone, Copy)]
pub struct MessageProtocol {
    role: SessionRole,
}

impl MessageProtocol {
    pub fn new(role: SessionRole) -> Self {
        Self { role }
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn encode(kind: MessageKind, payload: Value, from_player_id: &str) -> GameMessage {
        GameMessage::new(kind, payload, from_player_id)
    }

    pub fn dispatch(&self, state: &mut SessionState, message: &GameMessage) -> DispatchOutcome {
        match &message.kind {
            MessageKind::StateUpdate => {
                // The host is the source of state-update; it never merges one.
                if self.role.is_host() {
                    return DispatchOutcome::Ignored;
                }
                with_payload::<StateUpdate>(message, |update| {
                    state.apply_update(update);
                    true
                })
            }
            MessageKind::GhostBallUpdate => with_payload::<GhostBallUpdate>(message, |update| {
                state.upsert_ghost_ball(update, now_millis());
                true
            }),
            MessageKind::ObstaclePlaced => {
                with_payload::<PlayerObstacle>(message, |obstacle| state.add_obstacle(obstacle))
            }
            MessageKind::PlayerJoined => with_payload::<Player>(message, |player| {
                state.add_player(player);
                true
            }),
            MessageKind::PlayerLeft => {
                with_payload::<PlayerLeft>(message, |left| state.remove_player(&left.player_id))
            }
            MessageKind::ShotTaken => {
                with_payload::<ShotTaken>(message, |shot| state.record_shot(&shot.player_id, shot.hole))
            }
            MessageKind::HoleCompleted => with_payload::<HoleCompleted>(message, |done| {
                state.record_first_to_hole(done.hole, &done.player_id)
            }),
            MessageKind::Unknown(name) => {
                warn!("Unknown message type '{}' from {}", name, message.from_player_id);
                DispatchOutcome::Unknown
            }
        }
    }
}

fn with_payload<T: DeserializeOwned>(
    message: &GameMessage,
    apply: impl FnOnce(T) -> bool,
) -> DispatchOutcome {
    match serde_json::from_value::<T>(message.payload.clone()) {
        Ok(payload) => {
            if apply(payload) {
                DispatchOutcome::Applied
            } else {
                debug!("{} from {} changed nothing", message.kind, message.from_player_id);
                DispatchOutcome::Ignored
            }
        }
        Err(e) => {
            warn!(
                "Dropping {} from {}: bad payload: {}",
                message.kind, message.from_player_id, e
            );
            DispatchOutcome::Malformed
        }
    }
}
