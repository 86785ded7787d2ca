mod message_protocol;

pub use message_protocol::{DispatchOutcome, MessageProtocol};
