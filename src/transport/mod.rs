//! # Transport Interface
//!
//! Spec §4.3: `Send(ctx, SecureMessage) -> (Response, error)`. Synchronous
//! request/response; the transport is responsible for delivery only — it
//! MUST NOT sign, encrypt, or otherwise interpret the envelope it carries.

use std::time::Duration;

use thiserror::Error;

use crate::message::SecureMessage;

/// Ambient per-call context: a deadline the transport and DID resolver must
/// honor (spec §5, "every public operation accepts an ambient context
/// carrying a deadline"). Modeled as a simple timeout rather than a
/// `std::time::Instant` so callers don't need a shared clock source; the
/// transport computes its own deadline from `timeout` at call time.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    pub timeout: Duration,
}

impl CallContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// The transport's reply to a `Send`. Handshake replies carry the peer's
/// next-phase `SecureMessage`; data-plane sends may return an empty
/// acknowledgement, represented as `message: None`.
#[derive(Debug, Clone)]
pub struct Response {
    pub message: Option<SecureMessage>,
}

impl Response {
    pub fn empty() -> Self {
        Self { message: None }
    }

    pub fn with_message(message: SecureMessage) -> Self {
        Self {
            message: Some(message),
        }
    }
}

/// Transport-layer failure surfaces.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    #[error("transport timed out after {0:?}")]
    Timeout(Duration),

    #[error("peer closed the connection: {0}")]
    PeerClosed(String),
}

/// External collaborator contract carrying an already-prepared envelope
/// between peers. The transport converts `SecureMessage` to/from wire
/// format but MUST preserve every field byte-exact.
pub trait Transport: Send + Sync {
    fn send(&self, ctx: &CallContext, message: SecureMessage) -> Result<Response, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_has_a_sane_timeout() {
        let ctx = CallContext::default();
        assert_eq!(ctx.timeout, Duration::from_secs(30));
    }

    #[test]
    fn response_empty_has_no_message() {
        assert!(Response::empty().message.is_none());
    }
}
