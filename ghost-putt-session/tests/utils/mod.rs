mod event_log;
mod raw_joiner;
mod test_network;

pub use event_log::*;
pub use raw_joiner::*;
pub use test_network::*;
