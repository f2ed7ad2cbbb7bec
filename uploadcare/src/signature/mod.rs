//! Secure upload signatures.
//!
//! A secure upload carries an `expire` Unix timestamp and a `signature`, the
//! hex-encoded HMAC-SHA256 of the decimal `expire` keyed by the project secret key.
//! The upload service recomputes the signature and rejects mismatched or expired requests.

mod expire;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub use expire::Expire;

use crate::error::UploadcareResult;

type HmacSha256 = Hmac<Sha256>;

/// Signature and resolved expiry sent alongside a secure upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureSignature {
    /// Hex-encoded HMAC-SHA256 signature
    pub signature: String,
    /// Unix timestamp (seconds) after which the signature is rejected
    pub expire: i64,
}

/// Computes the secure upload signature for an already resolved expiry.
///
/// Deterministic: the same `(secret_key, expire)` pair always yields the same signature.
#[must_use]
pub fn generate_secure_signature(secret_key: &str, expire: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(expire.to_string().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Resolves `expire` against the current time and signs it with `secret_key`.
///
/// # Errors
///
/// Returns `UploadcareError::InvalidExpiration` if `expire` is not in a recognized format
pub fn sign(secret_key: &str, expire: impl Into<Expire>) -> UploadcareResult<SecureSignature> {
    sign_at(secret_key, expire, Utc::now())
}

/// Same as [`sign`], with relative expirations resolved against `now`.
///
/// # Errors
///
/// Returns `UploadcareError::InvalidExpiration` if `expire` is not in a recognized format
pub fn sign_at(
    secret_key: &str,
    expire: impl Into<Expire>,
    now: DateTime<Utc>,
) -> UploadcareResult<SecureSignature> {
    let expire = expire.into().resolve_at(now)?;
    Ok(SecureSignature {
        signature: generate_secure_signature(secret_key, expire),
        expire,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadcareError;

    #[test]
    fn test_signature_known_vector() {
        assert_eq!(
            generate_secure_signature("secret123", 1_653_429_047),
            "7f234a8bddea227d9de416452a100e6df53b2393e69568807abfbb050a694a17"
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let first = sign("secret123", 1_653_429_047_i64).unwrap();
        let second = sign("secret123", 1_653_429_047_i64).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.expire, 1_653_429_047);
        assert_eq!(first.signature.len(), 64);
    }

    #[test]
    fn test_signature_depends_on_key_and_expire() {
        let base = generate_secure_signature("secret123", 1_653_429_047);
        assert_ne!(base, generate_secure_signature("secret124", 1_653_429_047));
        assert_ne!(base, generate_secure_signature("secret123", 1_653_429_048));
    }

    #[test]
    fn test_relative_expire_resolves_near_now() {
        let before = Utc::now().timestamp();
        let signed = sign("secret123", "in 30 minutes").unwrap();
        let after = Utc::now().timestamp();

        assert!(signed.expire >= before + 30 * 60);
        assert!(signed.expire <= after + 30 * 60);
        assert_eq!(
            signed.signature,
            generate_secure_signature("secret123", signed.expire)
        );
    }

    #[test]
    fn test_sign_rejects_garbage() {
        let result = sign("secret123", "yesterday-ish");
        assert!(matches!(result, Err(UploadcareError::InvalidExpiration(_))));
    }
}
