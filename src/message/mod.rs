//! # Canonical Message Encoding
//!
//! The wire data model (spec §3) and its canonical encoding (spec §6): a
//! deterministic, sorted-key, whitespace-free JSON representation used both
//! on the wire and as the input to handshake signatures and transcript
//! hashes.

mod canonical;
mod types;

pub use canonical::{decode_b64, encode_b64, to_canonical_json};
pub use types::{
    now_unix, CompleteMessage, EnvelopeRole, HandshakeRole, InvitationMessage, RequestMessage,
    ResponseMessage, SecureMessage, SessionSeed, TaskId, Timestamp,
};
