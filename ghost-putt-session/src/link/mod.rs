mod link_state;
mod peer_link;

pub use link_state::{LinkEvent, LinkState, transition};
pub use peer_link::PeerLink;
