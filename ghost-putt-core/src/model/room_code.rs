use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const CODE_LENGTH: usize = 6;

/// Symbols used for room codes. `0`, `O`, `I` and `1` are left out so codes
/// survive being read aloud or copied by hand.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const SEPARATOR: char = '-';

/// Draws a fresh code. Uniqueness across calls is not guaranteed.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn validate(code: &str) -> bool {
    code.chars().count() == CODE_LENGTH
        && code
            .chars()
            .all(|c| c.is_ascii() && CODE_ALPHABET.contains(&(c as u8)))
}

/// `ABCDEF` becomes `ABC-DEF`. Anything that is not six characters long is
/// returned untouched.
pub fn format(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() != CODE_LENGTH {
        return code.to_owned();
    }

    let (head, tail) = chars.split_at(CODE_LENGTH / 2);
    let mut out = String::with_capacity(CODE_LENGTH + 1);
    out.extend(head);
    out.push(SEPARATOR);
    out.extend(tail);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRoomCode(pub String);

impl fmt::Display for InvalidRoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid room code '{}'", self.0)
    }
}

impl std::error::Error for InvalidRoomCode {}

/// A validated room code in canonical (separator-free) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub fn generate() -> Self {
        Self(generate())
    }

    /// Accepts either the canonical form or the display form produced by
    /// [`format`].
    pub fn parse(input: &str) -> Result<Self, InvalidRoomCode> {
        let trimmed = input.trim();
        let canonical = match trimmed.char_indices().nth(CODE_LENGTH / 2) {
            Some((idx, SEPARATOR)) if trimmed.chars().count() == CODE_LENGTH + 1 => {
                let mut s = trimmed.to_owned();
                s.remove(idx);
                s
            }
            _ => trimmed.to_owned(),
        };

        if validate(&canonical) {
            Ok(Self(canonical))
        } else {
            Err(InvalidRoomCode(input.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn display(&self) -> String {
        format(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = InvalidRoomCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = InvalidRoomCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
