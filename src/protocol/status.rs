//! # Status Lines
//!
//! Parsing of inbound `STATUS KEY=VALUE ...` lines into a [`StatusUpdate`].
//!
//! Parsing is permissive: unknown keys and tokens without `=` are skipped.
//! Values are kept raw here and coerced per field when the update is applied,
//! so a malformed field is dropped on its own without affecting the rest of
//! the line.

use std::fmt;
use std::num::ParseIntError;

/// Literal first token of every status line.
pub const STATUS_TOKEN: &str = "STATUS";

/// Keys recognized in a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    Mode,
    Run,
    Fault,
    Relay,
    Speed,
    Steps,
    AutoRun,
    AutoRunMs,
    AutoStopMs,
}

impl StatusKey {
    /// Every recognized key, in wire order.
    pub const ALL: [StatusKey; 9] = [
        StatusKey::Mode,
        StatusKey::Run,
        StatusKey::Fault,
        StatusKey::Relay,
        StatusKey::Speed,
        StatusKey::Steps,
        StatusKey::AutoRun,
        StatusKey::AutoRunMs,
        StatusKey::AutoStopMs,
    ];

    /// Looks up a key from an upper-cased wire token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "MODE" => Some(StatusKey::Mode),
            "RUN" => Some(StatusKey::Run),
            "FAULT" => Some(StatusKey::Fault),
            "RELAY" => Some(StatusKey::Relay),
            "SPEED" => Some(StatusKey::Speed),
            "STEPS" => Some(StatusKey::Steps),
            "ARUN" => Some(StatusKey::AutoRun),
            "ARUNMS" => Some(StatusKey::AutoRunMs),
            "ASTOPMS" => Some(StatusKey::AutoStopMs),
            _ => None,
        }
    }

    /// Wire token of this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKey::Mode => "MODE",
            StatusKey::Run => "RUN",
            StatusKey::Fault => "FAULT",
            StatusKey::Relay => "RELAY",
            StatusKey::Speed => "SPEED",
            StatusKey::Steps => "STEPS",
            StatusKey::AutoRun => "ARUN",
            StatusKey::AutoRunMs => "ARUNMS",
            StatusKey::AutoStopMs => "ASTOPMS",
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed status line: recognized keys with their raw values, in line order.
///
/// A key may appear more than once; later occurrences win when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    fields: Vec<(StatusKey, String)>,
}

impl StatusUpdate {
    /// Iterates over the recognized fields in the order they appeared.
    pub fn fields(&self) -> impl Iterator<Item = (StatusKey, &str)> {
        self.fields.iter().map(|(key, value)| (*key, value.as_str()))
    }

    /// Raw value of the last occurrence of `key`, if present.
    pub fn get(&self, key: StatusKey) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Parses a status line into a [`StatusUpdate`].
///
/// The first whitespace-delimited token is skipped. Every following token is
/// split on its first `=`; the key is upper-cased and the value trimmed.
/// Tokens without `=` and unrecognized keys are ignored.
pub fn parse_status_line(line: &str) -> StatusUpdate {
    let fields = line
        .split_whitespace()
        .skip(1)
        .filter_map(|token| token.split_once('='))
        .filter_map(|(key, value)| {
            let key = key.trim().to_uppercase();
            StatusKey::from_token(&key).map(|key| (key, value.trim().to_owned()))
        })
        .collect();
    StatusUpdate { fields }
}

/// Flag fields are set only by the exact value `"1"`.
pub fn parse_flag(value: &str) -> bool {
    value == "1"
}

/// Integer field coercion. An `Err` means the field is left untouched.
pub fn parse_number<T>(value: &str) -> Result<T, ParseIntError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    value.parse::<T>()
}
