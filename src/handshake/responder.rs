//! Responder-side handshake state machine (spec §4.4).
//!
//! Drives phases 2 (Request) and 4 (Complete), and validates phases 1
//! (Invitation) and 3 (Response) as they arrive. Unlike the initiator, the
//! responder's own terminal action (`on_response`) both emits the outbound
//! wire message and yields the `SessionSeed` in the same call, since there
//! is no fifth phase for it to wait on.

use std::sync::Arc;
use std::time::SystemTime;

use rand::RngCore;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::SageConfig;
use crate::crypto::aead::AeadAlgorithm;
use crate::crypto::kem::KemKeyPair;
use crate::crypto::{hpke, sign};
use crate::did::{Did, DidResolver};
use crate::error::SageError;
use crate::message::{
    decode_b64, encode_b64, now_unix, to_canonical_json, EnvelopeRole, HandshakeRole,
    InvitationMessage, RequestMessage, ResponseMessage, SecureMessage, SessionSeed, TaskId,
};

use super::initiator::{hpke_info, proof_ciphertext, sign_phase, verify_phase, verify_proof_ciphertext};
use super::validate_timestamp;
use super::NonceCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderState {
    Init,
    ReceivedInvitation,
    SentRequest,
    Established,
    Failed,
}

pub struct Responder {
    state: ResponderState,
    context_id: Option<Uuid>,
    self_did: Did,
    peer_did: Option<Did>,
    signing_key: Arc<sign::SigningKey>,
    supported_algorithms: Vec<AeadAlgorithm>,
    ephemeral_kem: Option<KemKeyPair>,
    transcript: Vec<Vec<u8>>,
    shared_secret: Option<Zeroizing<[u8; 32]>>,
}

impl Responder {
    pub fn new(
        self_did: Did,
        signing_key: Arc<sign::SigningKey>,
        supported_algorithms: Vec<AeadAlgorithm>,
    ) -> Self {
        Self {
            state: ResponderState::Init,
            context_id: None,
            self_did,
            peer_did: None,
            signing_key,
            supported_algorithms,
            ephemeral_kem: None,
            transcript: Vec::new(),
            shared_secret: None,
        }
    }

    pub fn state(&self) -> ResponderState {
        self.state
    }

    pub fn context_id(&self) -> Option<Uuid> {
        self.context_id
    }

    /// Phase 1 validation, then phase 2: select a mutually supported
    /// algorithm, generate an ephemeral KEM key pair, and emit the signed
    /// Request.
    pub fn on_invitation(
        &mut self,
        resolver: &dyn DidResolver,
        config: &SageConfig,
        nonce_cache: &NonceCache,
        envelope: SecureMessage,
    ) -> Result<SecureMessage, SageError> {
        if self.state != ResponderState::Init {
            self.fail();
            return Err(SageError::protocol_violation("unexpected Invitation phase"));
        }

        let invitation: InvitationMessage = serde_json::from_str(&envelope.payload)
            .map_err(|e| SageError::protocol_violation(format!("malformed Invitation payload: {e}")))?;

        if invitation.to_did != self.self_did.as_str() {
            return Err(SageError::protocol_violation(
                "Invitation addressed to a different DID",
            ));
        }

        let peer_did = Did::new(invitation.from_did.clone())?;
        let peer_doc = resolver.resolve(&peer_did).map_err(SageError::from)?;
        if config.require_active_agent && !peer_doc.active {
            return Err(SageError::auth_failed(format!("peer {peer_did} is inactive")));
        }

        verify_phase(&envelope, &peer_doc.signing_public_key, &invitation.from_did)?;

        if !validate_timestamp(invitation.timestamp, config.max_clock_skew) {
            return Err(SageError::expired("Invitation timestamp outside clock skew"));
        }

        if !nonce_cache.observe(&invitation.from_did, &invitation.nonce1) {
            return Err(SageError::replay("Invitation nonce already seen for this peer"));
        }

        let selected_algorithm = invitation
            .initiator_capabilities
            .iter()
            .find(|alg| self.supported_algorithms.contains(alg))
            .cloned()
            .ok_or_else(|| {
                SageError::downgrade("no mutually supported AEAD algorithm in Invitation")
            })?;

        self.context_id = Some(invitation.context_id);
        self.peer_did = Some(peer_did);

        tracing::info!(
            context_id = %invitation.context_id,
            peer_did = %invitation.from_did,
            algorithm = ?selected_algorithm,
            "accepted handshake invitation"
        );

        let canonical_invitation = to_canonical_json(&invitation)?;
        self.transcript.push(canonical_invitation.clone().into_bytes());

        let ephemeral = crate::crypto::kem::generate_keypair();

        let mut nonce2 = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut nonce2);

        let request = RequestMessage {
            context_id: invitation.context_id,
            responder_ephemeral_kem_public: encode_b64(ephemeral.public.as_bytes()),
            selected_algorithm,
            nonce2: encode_b64(&nonce2),
            timestamp: now_unix(),
            transcript_hash: encode_b64(crate::crypto::sha256(canonical_invitation.as_bytes()).as_bytes()),
        };
        let canonical_request = to_canonical_json(&request)?;
        self.transcript.push(canonical_request.clone().into_bytes());

        self.ephemeral_kem = Some(ephemeral);

        let envelope = sign_phase(
            &self.signing_key,
            invitation.context_id,
            self.self_did.as_str(),
            TaskId::HandshakeRequest,
            canonical_request,
            EnvelopeRole::Responder,
        )?;
        self.state = ResponderState::SentRequest;
        Ok(envelope)
    }

    /// Phase 3 validation, then phase 4: derive the shared secret via HPKE,
    /// verify the initiator's proof of possession, and emit the signed
    /// Complete ack alongside the resulting `SessionSeed`.
    pub fn on_response(
        &mut self,
        resolver: &dyn DidResolver,
        config: &SageConfig,
        envelope: SecureMessage,
    ) -> Result<(SecureMessage, SessionSeed), SageError> {
        if self.state != ResponderState::SentRequest {
            self.fail();
            return Err(SageError::protocol_violation("unexpected Response phase"));
        }
        let context_id = self.context_id.ok_or_else(|| {
            self.fail();
            SageError::protocol_violation("no contextId established")
        })?;
        let peer_did = self.peer_did.clone().ok_or_else(|| {
            self.fail();
            SageError::protocol_violation("no peer DID established")
        })?;

        let peer_doc = resolver.resolve(&peer_did).map_err(|e| {
            self.fail();
            SageError::from(e)
        })?;
        if config.require_active_agent && !peer_doc.active {
            self.fail();
            return Err(SageError::auth_failed(format!("peer {peer_did} is inactive")));
        }

        verify_phase(&envelope, &peer_doc.signing_public_key, peer_did.as_str()).map_err(|e| {
            self.fail();
            e
        })?;

        let response: ResponseMessage = serde_json::from_str(&envelope.payload).map_err(|e| {
            self.fail();
            SageError::protocol_violation(format!("malformed Response payload: {e}"))
        })?;

        if response.context_id != context_id {
            self.fail();
            return Err(SageError::protocol_violation("contextId mismatch in Response"));
        }

        let expected_transcript = crate::crypto::sha256(&self.transcript.concat());
        if response.transcript_hash != encode_b64(expected_transcript.as_bytes()) {
            self.fail();
            return Err(SageError::protocol_violation("transcriptHash mismatch in Response"));
        }

        let canonical_response = to_canonical_json(&response)?;
        self.transcript.push(canonical_response.into_bytes());

        let ephemeral = self.ephemeral_kem.take().ok_or_else(|| {
            self.fail();
            SageError::protocol_violation("no ephemeral KEM key pair established")
        })?;

        let encapped_bytes = decode_b64(&response.encapsulated_key).map_err(|e| {
            self.fail();
            e
        })?;
        let encapped = hpke::EncappedKey::from_bytes(&encapped_bytes).map_err(|e| {
            self.fail();
            SageError::from(e)
        })?;
        let info = hpke_info(context_id);
        let receiver_ctx = hpke::receiver_setup(&encapped, &ephemeral.secret, &info).map_err(|e| {
            self.fail();
            SageError::from(e)
        })?;

        let shared_secret_vec = receiver_ctx.export(b"sage-shared", 32).map_err(|e| {
            self.fail();
            SageError::from(e)
        })?;
        let mut shared_secret = Zeroizing::new([0u8; 32]);
        shared_secret.copy_from_slice(&shared_secret_vec);

        let ciphertext1 = decode_b64(&response.ciphertext1).map_err(|e| {
            self.fail();
            e
        })?;
        verify_proof_ciphertext(&shared_secret, context_id, true, &ciphertext1).map_err(|e| {
            self.fail();
            e
        })?;

        let ciphertext2 = proof_ciphertext(&shared_secret, context_id, false)?;
        let complete = crate::message::CompleteMessage {
            context_id,
            ciphertext2: encode_b64(&ciphertext2),
            transcript_hash: encode_b64(crate::crypto::sha256(&self.transcript.concat()).as_bytes()),
        };
        let canonical_complete = to_canonical_json(&complete)?;

        let envelope = sign_phase(
            &self.signing_key,
            context_id,
            self.self_did.as_str(),
            TaskId::HandshakeComplete,
            canonical_complete,
            EnvelopeRole::Responder,
        )?;

        self.state = ResponderState::Established;
        tracing::info!(context_id = %context_id, peer_did = %peer_did, "handshake established (responder)");
        let seed = SessionSeed {
            context_id,
            peer_did,
            self_did: self.self_did.clone(),
            shared_secret: *shared_secret,
            self_role: HandshakeRole::Responder,
            established_at: SystemTime::now(),
        };
        Ok((envelope, seed))
    }

    fn fail(&mut self) {
        tracing::warn!(context_id = ?self.context_id, "responder handshake failed");
        self.state = ResponderState::Failed;
        self.ephemeral_kem = None;
        self.shared_secret = None;
    }
}
