//! Line protocol spoken with the controller: lower-case commands out,
//! `STATUS` lines and free-text diagnostics in.

pub mod codec;
pub mod status;

pub use codec::{Line, classify_line, decode_line, encode_command};
pub use status::{StatusKey, StatusUpdate, parse_status_line};
