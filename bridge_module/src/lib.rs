pub mod adapters;
pub mod command;
pub mod message;
pub mod service;
pub mod signature;

pub use command::{parse_command, Command, ParseOutcome};
pub use message::{decode_envelope, decode_rich_text, encode_reply, DecodeError, Message, Response};
pub use signature::{generate_nonce, sign, verify, SignedFrame};
