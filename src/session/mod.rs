//! # Session Manager
//!
//! `Install(seed) -> sessionId`, `Encrypt(sessionId, pt) -> ct`,
//! `Decrypt(sessionId, ct) -> pt`, `Close(sessionId)`, `Sweep()`. The
//! session table sits behind a `parking_lot::RwLock` (many concurrent
//! encrypts/decrypts, occasional install/close/sweep); each session's
//! mutable state (send counter, replay window, failure count, last
//! activity) sits behind its own `parking_lot::Mutex` so one busy session
//! never blocks another.
//!
//! AEAD AAD for data-plane traffic is `version(1B) || contextId(16B) ||
//! counter(8B BE) || direction(1B)`, binding every ciphertext to the
//! protocol version, the handshake that produced the session, the exact
//! counter value, and which side sent it.

mod replay_window;

pub use replay_window::ReplayWindow;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::SageConfig;
use crate::crypto::aead::{self, AeadKey, AeadNonce, DIRECTION_INBOUND, DIRECTION_OUTBOUND};
use crate::crypto::kdf;
use crate::did::Did;
use crate::error::SageError;
use crate::message::{HandshakeRole, SessionSeed};

/// Wire format version mixed into every data-plane AAD.
const PROTOCOL_VERSION: u8 = 1;

const LABEL_I2R: &[u8] = b"sage-session-i2r";
const LABEL_R2I: &[u8] = b"sage-session-r2i";

const DIR_INITIATOR_TO_RESPONDER: u8 = 0x01;
const DIR_RESPONDER_TO_INITIATOR: u8 = 0x02;

fn build_aad(context_id: Uuid, counter: u64, direction: u8) -> [u8; 26] {
    let mut aad = [0u8; 26];
    aad[0] = PROTOCOL_VERSION;
    aad[1..17].copy_from_slice(context_id.as_bytes());
    aad[17..25].copy_from_slice(&counter.to_be_bytes());
    aad[25] = direction;
    aad
}

/// Maps a frame's logical direction to the AEAD nonce's direction tag.
/// `DIR_INITIATOR_TO_RESPONDER`/`DIR_RESPONDER_TO_INITIATOR` already agree
/// across both peers (see `Session::send_direction`/`recv_direction`), so
/// keying the nonce tag off the frame direction rather than the local
/// role means sender and receiver always derive the same nonce for a given
/// counter, unlike keying it off "am I sending or receiving locally" which
/// flips between the two ends.
fn nonce_tag(direction: u8) -> [u8; 4] {
    match direction {
        DIR_INITIATOR_TO_RESPONDER => DIRECTION_OUTBOUND,
        DIR_RESPONDER_TO_INITIATOR => DIRECTION_INBOUND,
        _ => unreachable!("direction is always one of the two constants above"),
    }
}

struct SessionInner {
    send_counter: u64,
    replay_window: ReplayWindow,
    aead_failures: u32,
    last_activity: Instant,
}

/// One established, bidirectional AEAD session.
struct Session {
    context_id: Uuid,
    peer_did: Did,
    #[allow(dead_code)]
    self_did: Did,
    self_role: HandshakeRole,
    send_key: AeadKey,
    recv_key: AeadKey,
    established_at: SystemTime,
    inner: Mutex<SessionInner>,
}

impl Session {
    fn send_direction(&self) -> u8 {
        match self.self_role {
            HandshakeRole::Initiator => DIR_INITIATOR_TO_RESPONDER,
            HandshakeRole::Responder => DIR_RESPONDER_TO_INITIATOR,
        }
    }

    fn recv_direction(&self) -> u8 {
        match self.self_role {
            HandshakeRole::Initiator => DIR_RESPONDER_TO_INITIATOR,
            HandshakeRole::Responder => DIR_INITIATOR_TO_RESPONDER,
        }
    }
}

/// Snapshot of a session's bookkeeping state, for operational introspection.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub context_id: Uuid,
    pub peer_did: Did,
    pub self_role: HandshakeRole,
    pub established_at: SystemTime,
    pub messages_sent: u64,
}

/// Holds every established session and enforces the counter, replay, and
/// idle-expiry rules data-plane traffic is required to follow.
pub struct SessionManager {
    config: SageConfig,
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(config: SageConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, context_id: Uuid) -> bool {
        self.sessions.read().contains_key(&context_id)
    }

    /// `Install(seed) -> sessionId`. Derives the two directional AEAD keys
    /// from the handshake's shared secret and inserts the session, keyed by
    /// its contextId. The seed's shared secret is zeroized the moment this
    /// returns, as `seed` is consumed.
    pub fn install(&self, seed: SessionSeed) -> Result<Uuid, SageError> {
        {
            let sessions = self.sessions.read();
            if sessions.len() >= self.config.max_sessions {
                return Err(SageError::capacity(format!(
                    "session table full ({} sessions)",
                    self.config.max_sessions
                )));
            }
        }

        let i2r = kdf::hkdf_fixed::<32>(&seed.shared_secret, seed.context_id.as_bytes(), LABEL_I2R)?;
        let r2i = kdf::hkdf_fixed::<32>(&seed.shared_secret, seed.context_id.as_bytes(), LABEL_R2I)?;

        let (send_key, recv_key) = match seed.self_role {
            HandshakeRole::Initiator => (AeadKey::from_bytes(&i2r)?, AeadKey::from_bytes(&r2i)?),
            HandshakeRole::Responder => (AeadKey::from_bytes(&r2i)?, AeadKey::from_bytes(&i2r)?),
        };

        let session = Arc::new(Session {
            context_id: seed.context_id,
            peer_did: seed.peer_did.clone(),
            self_did: seed.self_did.clone(),
            self_role: seed.self_role,
            send_key,
            recv_key,
            established_at: seed.established_at,
            inner: Mutex::new(SessionInner {
                send_counter: 0,
                replay_window: ReplayWindow::new(self.config.replay_window),
                aead_failures: 0,
                last_activity: Instant::now(),
            }),
        });

        let context_id = seed.context_id;
        let mut sessions = self.sessions.write();
        if sessions.len() >= self.config.max_sessions {
            return Err(SageError::capacity(format!(
                "session table full ({} sessions)",
                self.config.max_sessions
            )));
        }
        sessions.insert(context_id, session);
        tracing::info!(context_id = %context_id, "session installed");
        Ok(context_id)
    }

    /// `Encrypt(sessionId, pt) -> ct`. Returns the full data-plane frame:
    /// `counter(8B BE) || ciphertext`.
    pub fn encrypt(&self, context_id: Uuid, plaintext: &[u8]) -> Result<Vec<u8>, SageError> {
        let session = self.get(context_id)?;
        let mut inner = session.inner.lock();

        if inner.send_counter >= self.config.max_messages_per_session {
            drop(inner);
            self.sessions.write().remove(&context_id);
            tracing::warn!(context_id = %context_id, "session force-closed after exhausting its counter space");
            return Err(SageError::CounterOverflow(context_id.to_string()));
        }
        let counter = inner.send_counter;
        inner.send_counter += 1;
        inner.last_activity = Instant::now();
        drop(inner);

        let direction = session.send_direction();
        let aad = build_aad(context_id, counter, direction);
        let nonce = AeadNonce::from_counter(counter, nonce_tag(direction));
        let ciphertext = aead::seal(&session.send_key, &nonce, &aad, plaintext)?;

        let mut frame = Vec::with_capacity(8 + ciphertext.len());
        frame.extend_from_slice(&counter.to_be_bytes());
        frame.extend_from_slice(&ciphertext);
        Ok(frame)
    }

    /// `Decrypt(sessionId, ct) -> pt`. `frame` must be `counter(8B BE) ||
    /// ciphertext` as produced by [`Self::encrypt`]. Repeated AEAD failures
    /// past `max_aead_failures` force the session closed, matching the
    /// spec's abuse-containment rule.
    pub fn decrypt(&self, context_id: Uuid, frame: &[u8]) -> Result<Vec<u8>, SageError> {
        let session = self.get(context_id)?;
        if frame.len() < 8 {
            return Err(SageError::protocol_violation("data frame shorter than the counter prefix"));
        }
        let counter = u64::from_be_bytes(frame[..8].try_into().unwrap());
        let ciphertext = &frame[8..];

        {
            let mut inner = session.inner.lock();
            if !inner.replay_window.check_and_set(counter) {
                return Err(SageError::replay(format!(
                    "counter {counter} already seen or outside the replay window"
                )));
            }
        }

        let direction = session.recv_direction();
        let aad = build_aad(context_id, counter, direction);
        let nonce = AeadNonce::from_counter(counter, nonce_tag(direction));
        let result = aead::open(&session.recv_key, &nonce, &aad, ciphertext);

        match result {
            Ok(plaintext) => {
                session.inner.lock().last_activity = Instant::now();
                Ok(plaintext)
            }
            Err(e) => {
                let should_close = {
                    let mut inner = session.inner.lock();
                    inner.aead_failures += 1;
                    inner.aead_failures >= self.config.max_aead_failures
                };
                if should_close {
                    self.sessions.write().remove(&context_id);
                    tracing::warn!(context_id = %context_id, "session force-closed after repeated AEAD failures");
                }
                Err(SageError::from(e))
            }
        }
    }

    pub fn close(&self, context_id: Uuid) -> Result<(), SageError> {
        self.sessions
            .write()
            .remove(&context_id)
            .map(|_| ())
            .ok_or_else(|| SageError::session_not_found(context_id.to_string()))
    }

    /// `Sweep()`: remove every session idle past `idle_session_ttl`. Returns
    /// the number of sessions removed.
    pub fn sweep(&self) -> usize {
        let ttl = self.config.idle_session_ttl;
        let now = Instant::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| {
            let last_activity = session.inner.lock().last_activity;
            now.saturating_duration_since(last_activity) < ttl
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, "swept idle sessions");
        }
        removed
    }

    pub fn info(&self, context_id: Uuid) -> Result<SessionInfo, SageError> {
        let session = self.get(context_id)?;
        let messages_sent = session.inner.lock().send_counter;
        Ok(SessionInfo {
            context_id: session.context_id,
            peer_did: session.peer_did.clone(),
            self_role: session.self_role,
            established_at: session.established_at,
            messages_sent,
        })
    }

    fn get(&self, context_id: Uuid) -> Result<Arc<Session>, SageError> {
        self.sessions
            .read()
            .get(&context_id)
            .cloned()
            .ok_or_else(|| SageError::session_not_found(context_id.to_string()))
    }
}
