mod manager_command;
mod manager_handle;
mod peer_manager;
mod session_event;

pub use manager_command::ManagerCommand;
pub use manager_handle::PeerManagerHandle;
pub use peer_manager::PeerManager;
pub use session_event::SessionEvent;
