//! PKCE and `state` random generation (RFC 7636).
//!
//! `random_verifier` and `random_state` both draw raw entropy from
//! `getrandom` and encode it base64url without padding, matching RFC 7636's
//! unreserved-character requirement for `code_verifier` without needing a
//! custom alphabet filter.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};

use crate::error::{AuthError, Result};

/// Minimum entropy (in bytes) drawn for a `code_verifier`; base64url-encodes
/// to 43 characters, satisfying RFC 7636's 43-character minimum.
const VERIFIER_ENTROPY_BYTES: usize = 32;

/// Generates a fresh PKCE `code_verifier`: ≥ 32 bytes from a CSPRNG,
/// base64url-encoded without padding.
pub fn random_verifier() -> Result<String> {
    random_token(VERIFIER_ENTROPY_BYTES)
}

/// Computes the S256 PKCE `code_challenge` for `verifier`:
/// `base64url_nopad(sha256(verifier))`.
pub fn challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Generates a random `state` value with at least `bits` bits of entropy
/// (128 by default), base64url-encoded without padding.
pub fn random_state(bits: u32) -> Result<String> {
    let bytes = bits.div_ceil(8) as usize;
    random_token(bytes)
}

fn random_token(num_bytes: usize) -> Result<String> {
    let mut buf = vec![0u8; num_bytes];
    getrandom::getrandom(&mut buf)
        .map_err(|e| AuthError::Configuration(format!("RNG unavailable: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// Constant-time comparison of two `state` strings, to defeat timing side
/// channels on the PKCE state check.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_matches_rfc7636_vector() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(challenge(verifier), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn random_verifier_is_43_chars_and_unique() {
        let a = random_verifier().unwrap();
        let b = random_verifier().unwrap();
        assert_eq!(a.len(), 43);
        assert_eq!(b.len(), 43);
        assert_ne!(a, b);
    }

    #[test]
    fn random_state_has_at_least_requested_bits() {
        let state = random_state(128).unwrap();
        // base64url with no padding: 4 chars per 3 bytes, 16 bytes -> ceil(16*4/3) = 22 chars.
        assert!(state.len() >= 22);
    }

    #[test]
    fn constant_time_eq_matches_and_rejects() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
    }
}
