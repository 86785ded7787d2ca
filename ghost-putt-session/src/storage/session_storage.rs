use crate::storage::key_value_store::KeyValueStore;
use ghost_putt_core::{RoomCode, SessionState};
use std::sync::Arc;
use tracing::warn;

pub const PLAYER_NAME_KEY: &str = "ghost-putt-player-name";
pub const ROOM_CODE_KEY: &str = "ghost-putt-room-code";
pub const GAME_STATE_KEY: &str = "ghost-putt-game-state";

/// Typed access to what a player keeps between runs.
#[derive(Clone)]
pub struct SessionStorage {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save_player_name(&self, name: &str) {
        self.store.save(PLAYER_NAME_KEY, name);
    }

    pub fn player_name(&self) -> Option<String> {
        self.store.get(PLAYER_NAME_KEY)
    }

    pub fn save_room_code(&self, code: &RoomCode) {
        self.store.save(ROOM_CODE_KEY, code.as_str());
    }

    pub fn room_code(&self) -> Option<RoomCode> {
        let raw = self.store.get(ROOM_CODE_KEY)?;
        RoomCode::parse(&raw)
            .inspect_err(|e| warn!("Stored room code is invalid: {}", e))
            .ok()
    }

    pub fn clear_room_code(&self) {
        self.store.clear(ROOM_CODE_KEY);
    }

    pub fn save_game_state(&self, state: &SessionState) {
        match serde_json::to_string(state) {
            Ok(json) => self.store.save(GAME_STATE_KEY, &json),
            Err(e) => warn!("Failed to serialize game state: {}", e),
        }
    }

    pub fn game_state(&self) -> Option<SessionState> {
        let raw = self.store.get(GAME_STATE_KEY)?;
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!("Stored game state is unreadable: {}", e))
            .ok()
    }

    pub fn clear_game_state(&self) {
        self.store.clear(GAME_STATE_KEY);
    }
}
