//! # Handshake and Transport Data Model
//!
//! Struct definitions for `InvitationMessage`, `RequestMessage`,
//! `ResponseMessage`, `CompleteMessage`, `SecureMessage`, and `SessionSeed`.
//! Field names use the wire protocol's exact camelCase names via
//! `#[serde(rename = ...)]` rather than `rename_all = "camelCase"`, because
//! several fields (`fromDID`, `kemPublicKey`) capitalize the `DID`/`KEM`
//! abbreviation in a way the blanket camelCase transform would not
//! reproduce.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::aead::AeadAlgorithm;
use crate::did::Did;

/// Seconds-since-epoch timestamp, the unit the handshake's clock-skew check
/// operates on.
pub type Timestamp = u64;

pub fn now_unix() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs()
}

/// Phase 1 (Initiator -> Responder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationMessage {
    #[serde(rename = "contextId")]
    pub context_id: Uuid,
    #[serde(rename = "fromDID")]
    pub from_did: String,
    #[serde(rename = "toDID")]
    pub to_did: String,
    #[serde(rename = "initiatorCapabilities")]
    pub initiator_capabilities: Vec<AeadAlgorithm>,
    /// 16 random bytes, base64url-encoded.
    pub nonce1: String,
    pub timestamp: Timestamp,
}

/// Phase 2 (Responder -> Initiator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
    #[serde(rename = "contextId")]
    pub context_id: Uuid,
    #[serde(rename = "responderEphemeralKEMPublic")]
    pub responder_ephemeral_kem_public: String,
    #[serde(rename = "selectedAlgorithm")]
    pub selected_algorithm: AeadAlgorithm,
    pub nonce2: String,
    pub timestamp: Timestamp,
    #[serde(rename = "transcriptHash")]
    pub transcript_hash: String,
}

/// Phase 3 (Initiator -> Responder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(rename = "contextId")]
    pub context_id: Uuid,
    #[serde(rename = "initiatorEphemeralKEMPublic")]
    pub initiator_ephemeral_kem_public: String,
    #[serde(rename = "encapsulatedKey")]
    pub encapsulated_key: String,
    pub ciphertext1: String,
    #[serde(rename = "transcriptHash")]
    pub transcript_hash: String,
}

/// Phase 4 (Responder -> Initiator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteMessage {
    #[serde(rename = "contextId")]
    pub context_id: Uuid,
    pub ciphertext2: String,
    #[serde(rename = "transcriptHash")]
    pub transcript_hash: String,
}

/// Which of the two handshake roles a party played. Distinct from
/// `SecureMessage::role`, which also covers steady-state data-plane traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandshakeRole {
    Initiator,
    Responder,
}

impl HandshakeRole {
    pub fn other(self) -> Self {
        match self {
            Self::Initiator => Self::Responder,
            Self::Responder => Self::Initiator,
        }
    }
}

/// Internal output of a successful handshake. Never persisted or
/// serialized — it is consumed immediately by `session::SessionManager::install`
/// and the 32-byte shared secret is zeroized the moment the session's
/// send/recv keys are derived from it.
#[derive(ZeroizeOnDrop)]
pub struct SessionSeed {
    #[zeroize(skip)]
    pub context_id: Uuid,
    #[zeroize(skip)]
    pub peer_did: Did,
    #[zeroize(skip)]
    pub self_did: Did,
    pub shared_secret: [u8; 32],
    #[zeroize(skip)]
    pub self_role: HandshakeRole,
    #[zeroize(skip)]
    pub established_at: SystemTime,
}

/// Reserved `taskId` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskId {
    #[serde(rename = "handshake.invitation")]
    HandshakeInvitation,
    #[serde(rename = "handshake.request")]
    HandshakeRequest,
    #[serde(rename = "handshake.response")]
    HandshakeResponse,
    #[serde(rename = "handshake.complete")]
    HandshakeComplete,
    #[serde(rename = "data")]
    Data,
}

/// The role tag carried on the transport envelope itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeRole {
    Initiator,
    Responder,
    Client,
    Agent,
}

/// The transport envelope (`SecureMessage`, the wire contract).
///
/// `payload` carries either a canonical-encoded handshake phase message or,
/// for `taskId == Data`, the frame `counter(8B BE) || ciphertext`. The
/// transport MUST preserve every field byte-exact and MUST NOT interpret
/// `payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecureMessage {
    pub id: Uuid,
    #[serde(rename = "contextId")]
    pub context_id: Uuid,
    #[serde(rename = "taskId")]
    pub task_id: TaskId,
    /// Opaque to the transport; base64url-encoded on the wire.
    pub payload: String,
    #[serde(rename = "senderDID")]
    pub sender_did: String,
    /// Required on every handshake phase; may be omitted on data frames
    /// since the AEAD tag already binds authenticity to the session key.
    pub signature: Option<String>,
    pub metadata: HashMap<String, String>,
    pub role: EnvelopeRole,
}

impl SecureMessage {
    /// The bytes a signature is computed over: the canonical encoding of
    /// every field except `signature` itself, followed by the raw payload
    /// bytes. Handshake phases always sign; data frames may skip this.
    pub fn signing_input(&self) -> Vec<u8> {
        let header = format!(
            "{}|{}|{:?}|{}|{}",
            self.id, self.context_id, self.task_id, self.sender_did, self.role_str()
        );
        let mut input = header.into_bytes();
        input.extend_from_slice(self.payload.as_bytes());
        input
    }

    fn role_str(&self) -> &'static str {
        match self.role {
            EnvelopeRole::Initiator => "initiator",
            EnvelopeRole::Responder => "responder",
            EnvelopeRole::Client => "client",
            EnvelopeRole::Agent => "agent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_serializes_to_reserved_strings() {
        assert_eq!(
            serde_json::to_string(&TaskId::HandshakeInvitation).unwrap(),
            "\"handshake.invitation\""
        );
        assert_eq!(serde_json::to_string(&TaskId::Data).unwrap(), "\"data\"");
    }

    #[test]
    fn invitation_message_field_names_match_spec_casing() {
        let msg = InvitationMessage {
            context_id: Uuid::nil(),
            from_did: "did:sage:test:alice".into(),
            to_did: "did:sage:test:bob".into(),
            initiator_capabilities: vec![AeadAlgorithm::ChaCha20Poly1305],
            nonce1: "AAAA".into(),
            timestamp: 0,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"fromDID\""));
        assert!(json.contains("\"toDID\""));
        assert!(json.contains("\"contextId\""));
    }

    #[test]
    fn handshake_role_other_is_involutive() {
        assert_eq!(HandshakeRole::Initiator.other(), HandshakeRole::Responder);
        assert_eq!(
            HandshakeRole::Responder.other().other(),
            HandshakeRole::Responder
        );
    }

    #[test]
    fn signing_input_changes_with_payload() {
        let mut msg = SecureMessage {
            id: Uuid::nil(),
            context_id: Uuid::nil(),
            task_id: TaskId::Data,
            payload: "AAAA".into(),
            sender_did: "did:sage:test:alice".into(),
            signature: None,
            metadata: HashMap::new(),
            role: EnvelopeRole::Initiator,
        };
        let a = msg.signing_input();
        msg.payload = "BBBB".into();
        let b = msg.signing_input();
        assert_ne!(a, b);
    }
}
