//! Initiator-side handshake state machine (spec §4.4).
//!
//! Drives phases 1 (send Invitation) and 3 (send Response), and validates
//! phases 2 (Request) and 4 (Complete) as they arrive. On success this is a
//! one-shot factory: `on_complete` hands the caller a `SessionSeed` and the
//! `Initiator` has nothing further to do, per the design note avoiding a
//! handshake/session back-reference.

use std::sync::Arc;
use std::time::SystemTime;

use rand::RngCore;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::SageConfig;
use crate::crypto::aead::{AeadAlgorithm, AeadNonce, DIRECTION_INBOUND, DIRECTION_OUTBOUND};
use crate::crypto::kem::KemKeyPair;
use crate::crypto::{aead as aead_ops, hpke, kdf, sign};
use crate::did::{Did, DidResolver};
use crate::error::SageError;
use crate::message::{
    encode_b64, decode_b64, now_unix, to_canonical_json, CompleteMessage, EnvelopeRole,
    HandshakeRole, InvitationMessage, RequestMessage, ResponseMessage, SecureMessage, SessionSeed,
    TaskId,
};

use super::validate_timestamp;

/// States the initiator's state machine can occupy. `Established` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitiatorState {
    Init,
    SentInvitation,
    ReceivedRequest,
    SentResponse,
    Established,
    Failed,
}

pub struct Initiator {
    state: InitiatorState,
    context_id: Uuid,
    self_did: Did,
    peer_did: Did,
    signing_key: Arc<sign::SigningKey>,
    advertised_algorithms: Vec<AeadAlgorithm>,
    nonce1: Option<[u8; 16]>,
    ephemeral_kem: Option<KemKeyPair>,
    /// Canonical-encoded bytes of each phase seen so far, in protocol order.
    transcript: Vec<Vec<u8>>,
    shared_secret: Option<Zeroizing<[u8; 32]>>,
}

impl Initiator {
    pub fn new(
        self_did: Did,
        peer_did: Did,
        signing_key: Arc<sign::SigningKey>,
        advertised_algorithms: Vec<AeadAlgorithm>,
    ) -> Self {
        Self {
            state: InitiatorState::Init,
            context_id: Uuid::new_v4(),
            self_did,
            peer_did,
            signing_key,
            advertised_algorithms,
            nonce1: None,
            ephemeral_kem: None,
            transcript: Vec::new(),
            shared_secret: None,
        }
    }

    pub fn state(&self) -> InitiatorState {
        self.state
    }

    pub fn context_id(&self) -> Uuid {
        self.context_id
    }

    /// Phase 1: build, sign, and emit the Invitation.
    pub fn begin(&mut self) -> Result<SecureMessage, SageError> {
        if self.state != InitiatorState::Init {
            return Err(SageError::protocol_violation(
                "begin() called outside the Init state",
            ));
        }

        let mut nonce1 = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut nonce1);
        self.nonce1 = Some(nonce1);

        let invitation = InvitationMessage {
            context_id: self.context_id,
            from_did: self.self_did.as_str().to_string(),
            to_did: self.peer_did.as_str().to_string(),
            initiator_capabilities: self.advertised_algorithms.clone(),
            nonce1: encode_b64(&nonce1),
            timestamp: now_unix(),
        };
        let canonical = to_canonical_json(&invitation)?;
        self.transcript.push(canonical.clone().into_bytes());

        let envelope = self.sign_envelope(TaskId::HandshakeInvitation, canonical, EnvelopeRole::Initiator)?;
        self.state = InitiatorState::SentInvitation;
        Ok(envelope)
    }

    /// Phase 2 validation, then phase 3: verify the Request, derive the
    /// shared secret via HPKE, and emit the signed Response.
    pub fn on_request(
        &mut self,
        resolver: &dyn DidResolver,
        config: &SageConfig,
        envelope: SecureMessage,
    ) -> Result<SecureMessage, SageError> {
        if self.state != InitiatorState::SentInvitation {
            self.fail();
            return Err(SageError::protocol_violation("unexpected Request phase"));
        }

        let peer_doc = resolver.resolve(&self.peer_did).map_err(|e| {
            self.fail();
            SageError::from(e)
        })?;
        if config.require_active_agent && !peer_doc.active {
            self.fail();
            return Err(SageError::auth_failed(format!(
                "peer {} is inactive",
                self.peer_did
            )));
        }

        self.verify_envelope(&envelope, &peer_doc.signing_public_key)
            .map_err(|e| {
                self.fail();
                e
            })?;

        let request: RequestMessage = serde_json::from_str(&envelope.payload)
            .map_err(|e| {
                self.fail();
                SageError::protocol_violation(format!("malformed Request payload: {e}"))
            })?;

        if request.context_id != self.context_id {
            self.fail();
            return Err(SageError::protocol_violation("contextId mismatch in Request"));
        }

        if !validate_timestamp(request.timestamp, config.max_clock_skew) {
            self.fail();
            return Err(SageError::expired("Request timestamp outside clock skew"));
        }

        let expected_transcript = crate::crypto::sha256(self.transcript[0].as_slice());
        if request.transcript_hash != encode_b64(expected_transcript.as_bytes()) {
            self.fail();
            return Err(SageError::protocol_violation("transcriptHash mismatch in Request"));
        }

        if !self.advertised_algorithms.contains(&request.selected_algorithm) {
            self.fail();
            return Err(SageError::downgrade(format!(
                "responder selected {} which was not advertised",
                request.selected_algorithm
            )));
        }

        let responder_ephemeral =
            crate::crypto::kem::KemPublicKey::from_bytes(&decode_b64(&request.responder_ephemeral_kem_public)?)?;

        let request_canonical = to_canonical_json(&request)?;
        self.transcript.push(request_canonical.into_bytes());

        let ephemeral = crate::crypto::kem::generate_keypair();
        let info = hpke_info(self.context_id);
        let (encapped, sender_ctx) = hpke::sender_setup(&responder_ephemeral, &info)?;

        let transcript_so_far = self.transcript.concat();
        let shared_secret_vec = sender_ctx.export(b"sage-shared", 32)?;
        let mut shared_secret = Zeroizing::new([0u8; 32]);
        shared_secret.copy_from_slice(&shared_secret_vec);
        drop(sender_ctx);

        let ciphertext1 = proof_ciphertext(&shared_secret, self.context_id, true)?;

        let response = ResponseMessage {
            context_id: self.context_id,
            initiator_ephemeral_kem_public: encode_b64(ephemeral.public.as_bytes()),
            encapsulated_key: encode_b64(&encapped.to_bytes()),
            ciphertext1: encode_b64(&ciphertext1),
            transcript_hash: encode_b64(crate::crypto::sha256(&transcript_so_far).as_bytes()),
        };
        let canonical = to_canonical_json(&response)?;
        self.transcript.push(canonical.clone().into_bytes());

        self.ephemeral_kem = Some(ephemeral);
        self.shared_secret = Some(shared_secret);

        let envelope = self.sign_envelope(TaskId::HandshakeResponse, canonical, EnvelopeRole::Initiator)?;
        self.state = InitiatorState::SentResponse;
        Ok(envelope)
    }

    /// Phase 4 validation: verify the Complete ack and emit the
    /// `SessionSeed` the session manager installs.
    pub fn on_complete(
        &mut self,
        resolver: &dyn DidResolver,
        config: &SageConfig,
        envelope: SecureMessage,
    ) -> Result<SessionSeed, SageError> {
        if self.state != InitiatorState::SentResponse {
            self.fail();
            return Err(SageError::protocol_violation("unexpected Complete phase"));
        }

        let peer_doc = resolver.resolve(&self.peer_did).map_err(|e| {
            self.fail();
            SageError::from(e)
        })?;
        if config.require_active_agent && !peer_doc.active {
            self.fail();
            return Err(SageError::auth_failed(format!(
                "peer {} is inactive",
                self.peer_did
            )));
        }

        self.verify_envelope(&envelope, &peer_doc.signing_public_key)
            .map_err(|e| {
                self.fail();
                e
            })?;

        let complete: CompleteMessage = serde_json::from_str(&envelope.payload).map_err(|e| {
            self.fail();
            SageError::protocol_violation(format!("malformed Complete payload: {e}"))
        })?;

        if complete.context_id != self.context_id {
            self.fail();
            return Err(SageError::protocol_violation("contextId mismatch in Complete"));
        }

        let expected_transcript = crate::crypto::sha256(&self.transcript.concat());
        if complete.transcript_hash != encode_b64(expected_transcript.as_bytes()) {
            self.fail();
            return Err(SageError::protocol_violation("transcriptHash mismatch in Complete"));
        }

        let shared_secret = self.shared_secret.take().ok_or_else(|| {
            self.fail();
            SageError::protocol_violation("no shared secret established")
        })?;

        let ciphertext2 = decode_b64(&complete.ciphertext2)?;
        verify_proof_ciphertext(&shared_secret, self.context_id, false, &ciphertext2).map_err(|e| {
            self.fail();
            e
        })?;

        self.state = InitiatorState::Established;
        tracing::info!(context_id = %self.context_id, peer_did = %self.peer_did, "handshake established (initiator)");
        Ok(SessionSeed {
            context_id: self.context_id,
            peer_did: self.peer_did.clone(),
            self_did: self.self_did.clone(),
            shared_secret: *shared_secret,
            self_role: HandshakeRole::Initiator,
            established_at: SystemTime::now(),
        })
    }

    fn fail(&mut self) {
        tracing::warn!(context_id = %self.context_id, "initiator handshake failed");
        self.state = InitiatorState::Failed;
        self.ephemeral_kem = None;
        self.shared_secret = None;
    }

    fn sign_envelope(
        &self,
        task_id: TaskId,
        canonical_payload: String,
        role: EnvelopeRole,
    ) -> Result<SecureMessage, SageError> {
        sign_phase(&self.signing_key, self.context_id, self.self_did.as_str(), task_id, canonical_payload, role)
    }

    fn verify_envelope(
        &self,
        envelope: &SecureMessage,
        signer: &sign::VerifyingKey,
    ) -> Result<(), SageError> {
        verify_phase(envelope, signer, self.peer_did.as_str())
    }
}

/// Info string fed to HPKE, always including the protocol version and the
/// handshake's contextId so a shared secret can never be confused across
/// handshakes.
pub(super) fn hpke_info(context_id: Uuid) -> Vec<u8> {
    let mut info = hpke::INFO_VERSION.to_vec();
    info.extend_from_slice(context_id.as_bytes());
    info
}

/// Derive the fixed proof-of-possession ciphertext for one direction.
/// `from_initiator == true` produces ciphertext1 (phase 3); `false`
/// produces ciphertext2 (phase 4).
pub(super) fn proof_ciphertext(
    shared_secret: &[u8; 32],
    context_id: Uuid,
    from_initiator: bool,
) -> Result<Vec<u8>, SageError> {
    let proof_key = kdf::hkdf_fixed::<32>(shared_secret, b"", b"sage-hs-proof-key")?;
    let key = aead_ops::AeadKey::from_bytes(&proof_key)?;
    let tag = if from_initiator {
        DIRECTION_OUTBOUND
    } else {
        DIRECTION_INBOUND
    };
    let nonce = AeadNonce::from_counter(0, tag);
    let label: &[u8] = if from_initiator {
        b"sage-hs-proof"
    } else {
        b"sage-hs-ack"
    };
    let mut plaintext = label.to_vec();
    plaintext.extend_from_slice(context_id.as_bytes());
    Ok(aead_ops::seal(&key, &nonce, context_id.as_bytes(), &plaintext)?)
}

pub(super) fn verify_proof_ciphertext(
    shared_secret: &[u8; 32],
    context_id: Uuid,
    from_initiator: bool,
    ciphertext: &[u8],
) -> Result<(), SageError> {
    let proof_key = kdf::hkdf_fixed::<32>(shared_secret, b"", b"sage-hs-proof-key")?;
    let key = aead_ops::AeadKey::from_bytes(&proof_key)?;
    let tag = if from_initiator {
        DIRECTION_OUTBOUND
    } else {
        DIRECTION_INBOUND
    };
    let nonce = AeadNonce::from_counter(0, tag);
    let plaintext = aead_ops::open(&key, &nonce, context_id.as_bytes(), ciphertext)
        .map_err(|_| SageError::AuthFailed("proof-of-possession ciphertext invalid".into()))?;
    let label: &[u8] = if from_initiator {
        b"sage-hs-proof"
    } else {
        b"sage-hs-ack"
    };
    let mut expected = label.to_vec();
    expected.extend_from_slice(context_id.as_bytes());
    if plaintext != expected {
        return Err(SageError::AuthFailed("proof-of-possession mismatch".into()));
    }
    Ok(())
}

/// Sign a handshake phase payload and wrap it in a `SecureMessage` envelope.
/// Shared by both `Initiator` and `Responder`.
pub(super) fn sign_phase(
    signing_key: &sign::SigningKey,
    context_id: Uuid,
    sender_did: &str,
    task_id: TaskId,
    canonical_payload: String,
    role: EnvelopeRole,
) -> Result<SecureMessage, SageError> {
    let mut envelope = SecureMessage {
        id: Uuid::new_v4(),
        context_id,
        task_id,
        payload: canonical_payload,
        sender_did: sender_did.to_string(),
        signature: None,
        metadata: Default::default(),
        role,
    };
    let signing_input = envelope.signing_input();
    let signature = sign::sign(signing_key, &signing_input)?;
    envelope.signature = Some(encode_b64(&signature));
    Ok(envelope)
}

/// Verify a handshake envelope's signature against the claimed sender's
/// registered key, and that the sender DID matches the expected peer.
pub(super) fn verify_phase(
    envelope: &SecureMessage,
    signer: &sign::VerifyingKey,
    expected_sender_did: &str,
) -> Result<(), SageError> {
    if envelope.sender_did != expected_sender_did {
        return Err(SageError::auth_failed(format!(
            "unexpected sender DID {}, expected {}",
            envelope.sender_did, expected_sender_did
        )));
    }
    let signature_b64 = envelope
        .signature
        .as_ref()
        .ok_or_else(|| SageError::auth_failed("handshake envelope missing required signature"))?;
    let signature = decode_b64(signature_b64)?;
    let signing_input = envelope.signing_input();
    sign::verify(signer, &signing_input, &signature)
        .map_err(|_| SageError::auth_failed("handshake signature verification failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_transitions_to_sent_invitation() {
        let (sk, _vk) = sign::SigningKey::generate(sign::Algorithm::Ed25519).unwrap();
        let mut initiator = Initiator::new(
            Did::new("did:sage:test:alice").unwrap(),
            Did::new("did:sage:test:bob").unwrap(),
            Arc::new(sk),
            vec![AeadAlgorithm::ChaCha20Poly1305],
        );
        let envelope = initiator.begin().unwrap();
        assert_eq!(initiator.state(), InitiatorState::SentInvitation);
        assert_eq!(envelope.task_id, TaskId::HandshakeInvitation);
        assert!(envelope.signature.is_some());
    }

    #[test]
    fn begin_is_one_shot() {
        let (sk, _vk) = sign::SigningKey::generate(sign::Algorithm::Ed25519).unwrap();
        let mut initiator = Initiator::new(
            Did::new("did:sage:test:alice").unwrap(),
            Did::new("did:sage:test:bob").unwrap(),
            Arc::new(sk),
            vec![AeadAlgorithm::ChaCha20Poly1305],
        );
        initiator.begin().unwrap();
        assert!(initiator.begin().is_err());
    }
}
