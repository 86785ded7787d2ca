mod game;
mod message;
mod peer;
mod role;
pub mod room_code;
mod session_state;
mod signaling;

pub use game::{
    BallPosition, GameStatus, GhostBall, GhostBallUpdate, HoleCompleted, Obstacle, ObstacleType,
    Player, PlayerLeft, PlayerObstacle, Position, ShotTaken,
};
pub use message::{GameMessage, MessageKind, now_millis};
pub use peer::PeerId;
pub use role::SessionRole;
pub use room_code::{CODE_ALPHABET, CODE_LENGTH, InvalidRoomCode, RoomCode};
pub use session_state::{SessionState, StateUpdate};
pub use signaling::{IceServerConfig, RelayFrame, SignalKind, SignalingMessage};
