//! Peer-to-peer session layer for Ghost Putt: signaling, data links, the
//! peer manager and the game message protocol.

pub mod config;
pub mod error;
pub mod link;
pub mod manager;
pub mod protocol;
pub mod signaling;
pub mod storage;
pub mod transport;

pub use config::SessionConfig;
pub use error::SessionError;
pub use link::{LinkState, PeerLink};
pub use manager::{PeerManager, PeerManagerHandle, SessionEvent};
pub use protocol::{DispatchOutcome, MessageProtocol};
pub use signaling::{MemoryRelay, SignalingChannel, SignalingRelay, WsRelay};
pub use storage::{KeyValueStore, SessionStorage};
pub use transport::{LinkConnector, LinkDriver, MemoryNetwork, TransportEvent, WebRtcConnector};
