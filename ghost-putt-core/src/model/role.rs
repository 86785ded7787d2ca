use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed when a room is created or joined. The host is the hub of a star;
/// a joiner holds a single link to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Host,
    Joiner,
}

impl SessionRole {
    pub fn is_host(self) -> bool {
        matches!(self, SessionRole::Host)
    }
}

impl fmt::Display for SessionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionRole::Host => f.write_str("host"),
            SessionRole::Joiner => f.write_str("joiner"),
        }
    }
}
