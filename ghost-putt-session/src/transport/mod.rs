mod link_driver;
mod memory_network;
mod transport_event;
mod webrtc_connector;

pub use link_driver::{LinkConnector, LinkDriver};
pub use memory_network::MemoryNetwork;
pub use transport_event::TransportEvent;
pub use webrtc_connector::{DATA_CHANNEL_LABEL, WebRtcConnector};
