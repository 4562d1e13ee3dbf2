//! Webhook signature verification.
//!
//! Senders sign the raw request body with HMAC-SHA512 using the shared
//! secret and put the lower-case hex digest in the `X-Webhook-Hmac` header.

use std::env;
use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::ConfigError;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the hex-encoded signature.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Hmac";

/// Environment variable holding the shared secret.
pub const SECRET_ENV_VAR: &str = "WEBHOOK_HMAC_SECRET";

/// Shared HMAC secret. Never printed.
#[derive(Clone)]
pub struct HmacSecret(Arc<[u8]>);

impl HmacSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(secret.into()))
    }

    /// Read the secret through `lookup`. Unset and empty are both fatal.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(SECRET_ENV_VAR)
            .filter(|s| !s.is_empty())
            .map(Self::new)
            .ok_or(ConfigError::MissingSecret)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for HmacSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HmacSecret([REDACTED])")
    }
}

/// Verifies request bodies against caller-supplied signatures.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: HmacSecret,
}

impl SignatureVerifier {
    pub fn new(secret: HmacSecret) -> Self {
        Self { secret }
    }

    /// Build a verifier from `WEBHOOK_HMAC_SECRET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        HmacSecret::from_lookup(|name| env::var(name).ok()).map(Self::new)
    }

    /// Hex-encoded HMAC-SHA512 of `payload` under the shared secret.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");

        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check `candidate` against the signature of `payload`.
    ///
    /// Malformed candidates are simply unequal. The comparison does not
    /// short-circuit on the first differing byte.
    pub fn validate(&self, payload: &[u8], candidate: &str) -> bool {
        let expected = self.sign(payload);

        let valid: bool = expected.as_bytes().ct_eq(candidate.as_bytes()).into();

        if !valid {
            warn!(
                expected_length = expected.len(),
                actual_length = candidate.len(),
                "webhook_signature_mismatch"
            );
        }

        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(HmacSecret::new("test-signing-key"))
    }

    #[test]
    fn test_validate_round_trip() {
        let verifier = verifier();
        let payloads: [&[u8]; 4] = [
            b"",
            b"{\"id\":\"abc123\",\"type\":\"message\"}",
            b"not json at all",
            &[0u8, 159, 146, 150, 255],
        ];

        for payload in payloads {
            let signature = verifier.sign(payload);
            assert!(verifier.validate(payload, &signature));
        }
    }

    #[test]
    fn test_signature_matches_reference_hmac() {
        let payload = b"{\"id\":\"abc123\"}";
        let mut mac = HmacSha512::new_from_slice(b"test-signing-key").unwrap();
        mac.update(payload);
        let reference = hex::encode(mac.finalize().into_bytes());

        assert_eq!(verifier().sign(payload), reference);
        assert_eq!(reference.len(), 128);
    }

    #[test]
    fn test_payload_mutation_rejected() {
        let verifier = verifier();
        let payload = b"{\"id\":\"abc123\",\"type\":\"message\"}".to_vec();
        let signature = verifier.sign(&payload);

        for i in 0..payload.len() {
            let mut mutated = payload.clone();
            mutated[i] ^= 0x01;
            assert!(!verifier.validate(&mutated, &signature), "mutation at {i} accepted");
        }
    }

    #[test]
    fn test_signature_mutation_rejected() {
        let verifier = verifier();
        let payload = b"payload";
        let signature = verifier.sign(payload);

        for i in 0..signature.len() {
            let mut bytes = signature.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(!verifier.validate(payload, &mutated), "mutation at {i} accepted");
        }
    }

    #[test]
    fn test_mismatch_position_does_not_matter() {
        let verifier = verifier();
        let payload = b"payload";
        let signature = verifier.sign(payload);

        let mut first = signature.clone().into_bytes();
        first[0] = if first[0] == b'a' { b'b' } else { b'a' };
        let mut last = signature.clone().into_bytes();
        let end = last.len() - 1;
        last[end] = if last[end] == b'a' { b'b' } else { b'a' };

        assert!(!verifier.validate(payload, std::str::from_utf8(&first).unwrap()));
        assert!(!verifier.validate(payload, std::str::from_utf8(&last).unwrap()));
    }

    #[test]
    fn test_malformed_candidates_rejected() {
        let verifier = verifier();
        let payload = b"payload";
        let signature = verifier.sign(payload);

        assert!(!verifier.validate(payload, ""));
        assert!(!verifier.validate(payload, "zz-not-hex"));
        assert!(!verifier.validate(payload, &signature[..64]));
        assert!(!verifier.validate(payload, &format!("{signature}00")));
        assert!(!verifier.validate(payload, &signature.to_uppercase()));
    }

    #[test]
    fn test_other_secret_rejected() {
        let other = SignatureVerifier::new(HmacSecret::new("another-key"));
        let signature = other.sign(b"payload");
        assert!(!verifier().validate(b"payload", &signature));
    }

    #[test]
    fn test_empty_key_still_signs() {
        let verifier = SignatureVerifier::new(HmacSecret::new(""));
        let signature = verifier.sign(b"payload");
        assert_eq!(signature.len(), 128);
        assert!(verifier.validate(b"payload", &signature));
    }

    #[test]
    fn test_secret_from_lookup() {
        let secret = HmacSecret::from_lookup(|name| {
            (name == SECRET_ENV_VAR).then(|| "test-signing-key".to_string())
        })
        .unwrap();
        let from_lookup = SignatureVerifier::new(secret);
        assert_eq!(from_lookup.sign(b"payload"), verifier().sign(b"payload"));

        assert!(matches!(
            HmacSecret::from_lookup(|_| None),
            Err(ConfigError::MissingSecret)
        ));
        assert!(matches!(
            HmacSecret::from_lookup(|_| Some(String::new())),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[test]
    fn test_from_env() {
        // Only test in the crate that touches this variable
        env::remove_var(SECRET_ENV_VAR);
        assert!(matches!(
            SignatureVerifier::from_env(),
            Err(ConfigError::MissingSecret)
        ));

        env::set_var(SECRET_ENV_VAR, "test-signing-key");
        let verifier_from_env = SignatureVerifier::from_env().unwrap();
        env::remove_var(SECRET_ENV_VAR);

        assert_eq!(verifier_from_env.sign(b"payload"), verifier().sign(b"payload"));
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = HmacSecret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "HmacSecret([REDACTED])");
        assert!(!format!("{:?}", SignatureVerifier::new(secret)).contains("hunter2"));
    }
}
