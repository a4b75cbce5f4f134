//! Password fingerprinting for cache keys.
//!
//! The fingerprint is a fast hash used **only** to key cached
//! authentication results; it never verifies identity. Verification
//! always goes through the slow Argon2 path in the API crate.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 16;

/// Compute a short hex fingerprint of a password.
pub fn password_fingerprint(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(FINGERPRINT_LEN);
    for byte in digest.iter().take(FINGERPRINT_LEN / 2) {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Build the cache key for a `(username, password)` pair.
pub fn auth_cache_key(username: &str, password: &str) -> String {
    format!("auth:{username}:{}", password_fingerprint(password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = password_fingerprint("hunter2");
        let b = password_fingerprint("hunter2");
        assert_eq!(a, b);
        assert_eq!(a.len(), FINGERPRINT_LEN);
    }

    #[test]
    fn different_passwords_differ() {
        assert_ne!(password_fingerprint("a"), password_fingerprint("b"));
    }

    #[test]
    fn cache_key_embeds_username_and_fingerprint() {
        let key = auth_cache_key("alice", "secret");
        assert!(key.starts_with("auth:alice:"));
        assert!(key.ends_with(&password_fingerprint("secret")));
    }
}
