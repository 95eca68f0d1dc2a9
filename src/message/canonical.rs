//! # Canonical Encoding
//!
//! Spec §6: "deterministic JSON with sorted keys, UTF-8, no insignificant
//! whitespace. Binary fields base64url without padding." This encoding is
//! used both on the wire and as the input to every handshake signature and
//! transcript hash, so any two conforming implementations MUST produce
//! byte-identical output for the same logical message.
//!
//! Sorted keys come for free: this crate does not enable serde_json's
//! `preserve_order` feature, so `serde_json::Map` is backed by a `BTreeMap`
//! and iterates keys in sorted order at every nesting level. Canonicalizing
//! a value is therefore "serialize to `Value`, then serialize the `Value`
//! back to a compact string" — the intermediate `Value` round-trip is what
//! forces key order, since serializing a struct directly would preserve
//! field-declaration order instead.

use serde::Serialize;
use serde_json::Value;

use crate::error::SageError;

/// Serialize `value` to its canonical form: sorted-key, compact (no
/// insignificant whitespace) JSON, UTF-8.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, SageError> {
    let as_value: Value = serde_json::to_value(value)
        .map_err(|e| SageError::protocol_violation(format!("canonical encode failed: {e}")))?;
    serde_json::to_string(&as_value)
        .map_err(|e| SageError::protocol_violation(format!("canonical encode failed: {e}")))
}

/// Encode bytes as base64url without padding, per the binary-field rule.
pub fn encode_b64(bytes: &[u8]) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a base64url-without-padding string.
pub fn decode_b64(s: &str) -> Result<Vec<u8>, SageError> {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| SageError::protocol_violation(format!("invalid base64url field: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_come_out_sorted_regardless_of_input_order() {
        let value = json!({ "zeta": 1, "alpha": 2, "middle": { "y": 1, "a": 2 } });
        let canonical = to_canonical_json(&value).unwrap();
        assert_eq!(
            canonical,
            r#"{"alpha":2,"middle":{"a":2,"y":1},"zeta":1}"#
        );
    }

    #[test]
    fn output_has_no_insignificant_whitespace() {
        let value = json!({ "a": [1, 2, 3] });
        let canonical = to_canonical_json(&value).unwrap();
        assert!(!canonical.contains(' '));
        assert!(!canonical.contains('\n'));
    }

    #[test]
    fn base64url_roundtrips_without_padding() {
        let bytes = b"\x00\x01\x02\xffsage";
        let encoded = encode_b64(bytes);
        assert!(!encoded.contains('='));
        assert_eq!(decode_b64(&encoded).unwrap(), bytes);
    }

    #[test]
    fn same_logical_value_different_construction_order_matches() {
        let a = json!({ "contextId": "c1", "fromDID": "did:sage:test:alice" });
        let b = json!({ "fromDID": "did:sage:test:alice", "contextId": "c1" });
        assert_eq!(to_canonical_json(&a).unwrap(), to_canonical_json(&b).unwrap());
    }
}
