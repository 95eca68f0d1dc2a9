//! # Test-Only Collaborators
//!
//! Reference implementations of [`DidResolver`] and [`Transport`] backed by
//! in-memory state, used by this crate's own integration tests and by
//! nothing else — application code has no business depending on the
//! `test-util` feature, the same convention the teacher used for its own
//! in-memory fixtures.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::did::{Did, DidDocument, DidError, DidResolver};
use crate::message::SecureMessage;
use crate::transport::{CallContext, Response, Transport, TransportError};

/// A `DidResolver` backed by a plain in-memory map, populated directly by
/// the test that constructs it.
#[derive(Default)]
pub struct InMemoryDidRegistry {
    documents: Mutex<HashMap<String, DidDocument>>,
}

impl InMemoryDidRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, document: DidDocument) {
        self.documents
            .lock()
            .unwrap()
            .insert(document.did.as_str().to_string(), document);
    }

    pub fn set_active(&self, did: &str, active: bool) {
        if let Some(doc) = self.documents.lock().unwrap().get_mut(did) {
            doc.active = active;
        }
    }
}

impl DidResolver for InMemoryDidRegistry {
    fn resolve(&self, did: &Did) -> Result<DidDocument, DidError> {
        self.documents
            .lock()
            .unwrap()
            .get(did.as_str())
            .cloned()
            .ok_or_else(|| DidError::NotFound(did.to_string()))
    }
}

/// A `Transport` that delivers directly to a registered handler closure
/// instead of crossing any real network boundary. Useful for driving both
/// sides of a handshake in a single process.
pub struct LoopbackTransport {
    handlers: Mutex<HashMap<String, Box<dyn Fn(SecureMessage) -> Response + Send>>>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler invoked when a message is sent to `peer_did`.
    pub fn register(&self, peer_did: impl Into<String>, handler: impl Fn(SecureMessage) -> Response + Send + 'static) {
        self.handlers.lock().unwrap().insert(peer_did.into(), Box::new(handler));
    }
}

impl Transport for LoopbackTransport {
    fn send(&self, _ctx: &CallContext, message: SecureMessage) -> Result<Response, TransportError> {
        let handlers = self.handlers.lock().unwrap();
        let handler = handlers
            .get(message.sender_did.as_str())
            .or_else(|| handlers.values().next());
        match handler {
            Some(handler) => Ok(handler(message)),
            None => Err(TransportError::Unavailable(format!(
                "no loopback handler registered for {}",
                message.sender_did
            ))),
        }
    }
}
