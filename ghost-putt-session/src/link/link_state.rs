use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    Error,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The handshake completed and the data channel opened.
    Opened,
    /// Transport failure or handshake deadline.
    Failed,
    /// Resources of a failed link were released.
    CleanedUp,
    RemoteClosed,
    Destroyed,
}

/// The whole link lifecycle. `None` means the event does not apply in
/// `state` and must be ignored; `Closed` accepts nothing.
pub fn transition(state: LinkState, event: LinkEvent) -> Option<LinkState> {
    use LinkEvent::*;
    use LinkState::*;

    match (state, event) {
        (Connecting, Opened) => Some(Connected),
        (Connecting | Connected, Failed) => Some(Error),
        (Connecting | Connected, RemoteClosed | Destroyed) => Some(Closed),
        (Error, CleanedUp | RemoteClosed | Destroyed) => Some(Closed),
        _ => None,
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Error => "error",
            LinkState::Closed => "closed",
        };
        f.write_str(name)
    }
}
