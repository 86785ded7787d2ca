mod memory_relay;
mod relay;
mod signaling_channel;
mod ws_relay;

pub use memory_relay::MemoryRelay;
pub use relay::{RelaySession, SignalingRelay};
pub use signaling_channel::{SignalHandler, SignalingChannel};
pub use ws_relay::WsRelay;
