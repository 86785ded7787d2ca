mod key_value_store;
mod session_storage;
mod url_params;

pub use key_value_store::{FileStore, KeyValueStore, MemoryStore};
pub use session_storage::{GAME_STATE_KEY, PLAYER_NAME_KEY, ROOM_CODE_KEY, SessionStorage};
pub use url_params::{ROOM_PARAM, room_code_from_url, shareable_link, without_room_code};
