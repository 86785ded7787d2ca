use crate::model::game::{
    BallPosition, GameStatus, GhostBall, GhostBallUpdate, Player, PlayerObstacle,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

const DEFAULT_TOTAL_HOLES: u32 = 3;
const FALLBACK_GHOST_COLOR: &str = "#9ca3af";

/// Shared game state mutated by the message protocol and by the local UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub current_hole: u32,
    pub total_holes: u32,
    pub players: Vec<Player>,
    /// Strokes per hole, index 0 is hole 1.
    pub scores: BTreeMap<String, Vec<u32>>,
    pub game_status: GameStatus,
    pub current_player_id: Option<String>,
    pub ball_positions: BTreeMap<String, BallPosition>,
    pub ghost_balls: Vec<GhostBall>,
    pub player_obstacles: Vec<PlayerObstacle>,
    pub first_to_hole: BTreeMap<u32, String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_hole: 1,
            total_holes: DEFAULT_TOTAL_HOLES,
            players: Vec::new(),
            scores: BTreeMap::new(),
            game_status: GameStatus::Lobby,
            current_player_id: None,
            ball_positions: BTreeMap::new(),
            ghost_balls: Vec::new(),
            player_obstacles: Vec::new(),
            first_to_hole: BTreeMap::new(),
        }
    }
}

impl SessionState {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn ghost_ball(&self, player_id: &str) -> Option<&GhostBall> {
        self.ghost_balls.iter().find(|g| g.player_id == player_id)
    }

    /// Adds the player, or replaces the record of a player already present
    /// while keeping their scores. Returns `true` if the player is new.
    pub fn add_player(&mut self, player: Player) -> bool {
        self.scores.entry(player.id.clone()).or_default();

        match self.players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => {
                *existing = player;
                false
            }
            None => {
                self.players.push(player);
                true
            }
        }
    }

    /// Removes the player together with every piece of state derived from
    /// them.
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != player_id);
        let removed = self.players.len() != before;

        let had_scores = self.scores.remove(player_id).is_some();
        let had_ball = self.ball_positions.remove(player_id).is_some();
        let ghosts_before = self.ghost_balls.len();
        self.ghost_balls.retain(|g| g.player_id != player_id);

        if self.current_player_id.as_deref() == Some(player_id) {
            self.current_player_id = None;
        }

        removed || had_scores || had_ball || ghosts_before != self.ghost_balls.len()
    }

    pub fn update_ball_position(&mut self, player_id: &str, position: BallPosition) {
        self.ball_positions.insert(player_id.to_owned(), position);
    }

    /// Last writer wins per player.
    pub fn upsert_ghost_ball(&mut self, update: GhostBallUpdate, now: u64) {
        if let Some(ghost) = self
            .ghost_balls
            .iter_mut()
            .find(|g| g.player_id == update.player_id)
        {
            ghost.position = update.position;
            ghost.last_update = now;
            return;
        }

        let (player_name, color) = match self.player(&update.player_id) {
            Some(p) => (p.name.clone(), p.color.clone()),
            None => (String::new(), FALLBACK_GHOST_COLOR.to_owned()),
        };

        self.ghost_balls.push(GhostBall {
            player_id: update.player_id,
            player_name,
            color,
            position: update.position,
            last_update: now,
        });
    }

    /// Appends the obstacle unless one with the same id is already placed.
    pub fn add_obstacle(&mut self, obstacle: PlayerObstacle) -> bool {
        if self
            .player_obstacles
            .iter()
            .any(|o| o.obstacle.id == obstacle.obstacle.id)
        {
            return false;
        }
        self.player_obstacles.push(obstacle);
        true
    }

    /// First reporter per hole wins; later reports are ignored.
    pub fn record_first_to_hole(&mut self, hole: u32, player_id: &str) -> bool {
        if self.first_to_hole.contains_key(&hole) {
            return false;
        }
        self.first_to_hole.insert(hole, player_id.to_owned());
        true
    }

    /// Counts one stroke for `player_id` on `hole` (1-based).
    pub fn record_shot(&mut self, player_id: &str, hole: u32) -> bool {
        let Some(index) = (hole as usize).checked_sub(1) else {
            return false;
        };

        let strokes = self.scores.entry(player_id.to_owned()).or_default();
        if strokes.len() <= index {
            strokes.resize(index + 1, 0);
        }
        strokes[index] += 1;
        true
    }

    pub fn apply_update(&mut self, update: StateUpdate) {
        let StateUpdate {
            current_hole,
            total_holes,
            players,
            scores,
            game_status,
            current_player_id,
            ball_positions,
            ghost_balls,
            player_obstacles,
            first_to_hole,
        } = update;

        if let Some(v) = current_hole {
            self.current_hole = v;
        }
        if let Some(v) = total_holes {
            self.total_holes = v;
        }
        if let Some(v) = players {
            self.players = v;
        }
        if let Some(v) = scores {
            self.scores = v;
        }
        if let Some(v) = game_status {
            self.game_status = v;
        }
        if let Some(v) = current_player_id {
            self.current_player_id = v;
        }
        if let Some(v) = ball_positions {
            self.ball_positions = v;
        }
        if let Some(v) = ghost_balls {
            self.ghost_balls = v;
        }
        if let Some(v) = player_obstacles {
            self.player_obstacles = v;
        }
        if let Some(v) = first_to_hole {
            self.first_to_hole = v;
        }
    }

    /// Full snapshot in update form, as the host broadcasts it.
    pub fn snapshot(&self) -> StateUpdate {
        StateUpdate {
            current_hole: Some(self.current_hole),
            total_holes: Some(self.total_holes),
            players: Some(self.players.clone()),
            scores: Some(self.scores.clone()),
            game_status: Some(self.game_status),
            current_player_id: Some(self.current_player_id.clone()),
            ball_positions: Some(self.ball_positions.clone()),
            ghost_balls: Some(self.ghost_balls.clone()),
            player_obstacles: Some(self.player_obstacles.clone()),
            first_to_hole: Some(self.first_to_hole.clone()),
        }
    }
}

/// Partial state; absent fields are left alone when merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hole: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_holes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Player>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<String, Vec<u32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_status: Option<GameStatus>,
    /// `null` on the wire clears the current player; a missing field keeps it.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub current_player_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ball_positions: Option<BTreeMap<String, BallPosition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ghost_balls: Option<Vec<GhostBall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_obstacles: Option<Vec<PlayerObstacle>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_to_hole: Option<BTreeMap<u32, String>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
