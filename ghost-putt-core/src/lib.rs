pub mod model;

pub use model::room_code;

pub use model::{
    BallPosition, GameMessage, GameStatus, GhostBall, GhostBallUpdate, HoleCompleted,
    IceServerConfig, InvalidRoomCode, MessageKind, Obstacle, ObstacleType, PeerId, Player,
    PlayerLeft, PlayerObstacle, Position, RelayFrame, RoomCode, SessionRole, SessionState,
    ShotTaken, SignalKind, SignalingMessage, StateUpdate, now_millis,
};
