pub use ghost_putt_core::{PeerId, RoomCode};

pub mod model {
    pub use ghost_putt_core::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use ghost_putt_session::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use ghost_putt_relay::*;
}
