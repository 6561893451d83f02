//! One-way password hashing.
//!
//! Hashes are PBKDF2-HMAC-SHA256 with a fresh 16-byte salt per call, stored as
//! a self-describing string:
//!
//! ```text
//! pbkdf2:sha256:<iterations>$<salt hex>$<derived key hex>
//! ```
//!
//! The iteration count travels with the hash, so raising the configured
//! count later does not invalidate passwords stored under the old one.

use sha2::Sha256;
use std::fmt;

/// Default PBKDF2 rounds for new hashes.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Salt byte length.
const SALT_BYTES: usize = 16;

/// Derived key byte length (SHA-256 output size).
const KEY_BYTES: usize = 32;

const METHOD_PREFIX: &str = "pbkdf2:sha256:";

/// An opaque stored password hash. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a value read back from storage.
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Salted PBKDF2 password hasher.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    /// Create a hasher that derives new hashes with `iterations` rounds (minimum 1).
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> PasswordHash {
        let salt: [u8; SALT_BYTES] = rand::random();
        let key = derive_key(plaintext, &salt, self.iterations);
        PasswordHash(format!(
            "{METHOD_PREFIX}{}${}${}",
            self.iterations,
            hex::encode(salt),
            hex::encode(key)
        ))
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// Returns `false` for malformed stored values rather than erroring.
    pub fn verify(&self, plaintext: &str, hash: &PasswordHash) -> bool {
        let Some((iterations, salt, expected)) = parse(hash.as_str()) else {
            return false;
        };
        let attempt = derive_key(plaintext, &salt, iterations);
        constant_time_eq(&attempt, &expected)
    }

    /// Whether `hash` was derived with a different iteration count than this
    /// hasher uses. Malformed values always need a rehash.
    pub fn needs_rehash(&self, hash: &PasswordHash) -> bool {
        parse(hash.as_str()).map_or(true, |(iterations, _, _)| iterations != self.iterations)
    }

    /// Burn one derivation so a lookup miss costs the same as a wrong password.
    pub fn dummy_verify(&self, plaintext: &str) {
        let _ = derive_key(plaintext, &[0u8; SALT_BYTES], self.iterations);
    }
}

fn derive_key(plaintext: &str, salt: &[u8], iterations: u32) -> [u8; KEY_BYTES] {
    let mut key = [0u8; KEY_BYTES];
    pbkdf2::pbkdf2_hmac::<Sha256>(plaintext.as_bytes(), salt, iterations, &mut key);
    key
}

/// Split a stored hash into (iterations, salt, derived key).
fn parse(stored: &str) -> Option<(u32, Vec<u8>, Vec<u8>)> {
    let rest = stored.strip_prefix(METHOD_PREFIX)?;
    let mut parts = rest.splitn(3, '$');
    let iterations: u32 = parts.next()?.parse().ok().filter(|n| *n > 0)?;
    let salt = hex::decode(parts.next()?).ok()?;
    let key = hex::decode(parts.next()?).ok()?;
    if key.len() != KEY_BYTES {
        return None;
    }
    Some((iterations, salt, key))
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
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

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(1_000)
    }

    #[test]
    fn verify_accepts_the_hashed_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash("pw1");
        assert!(hasher.verify("pw1", &hash));
    }

    #[test]
    fn verify_rejects_a_different_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash("pw1");
        assert!(!hasher.verify("pw2", &hash));
        assert!(!hasher.verify("", &hash));
        assert!(!hasher.verify("PW1", &hash));
    }

    #[test]
    fn same_password_hashes_differently_each_time() {
        let hasher = fast_hasher();
        let h1 = hasher.hash("same");
        let h2 = hasher.hash("same");
        assert_ne!(h1, h2);
        assert!(hasher.verify("same", &h1));
        assert!(hasher.verify("same", &h2));
    }

    #[test]
    fn hash_is_self_describing() {
        let hash = fast_hasher().hash("pw");
        let parts: Vec<&str> = hash.as_str().split('$').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "pbkdf2:sha256:1000");
        assert_eq!(parts[1].len(), SALT_BYTES * 2);
        assert_eq!(parts[2].len(), KEY_BYTES * 2);
    }

    #[test]
    fn verify_uses_the_stored_iteration_count() {
        let old = PasswordHasher::new(500).hash("pw");
        let current = PasswordHasher::new(2_000);
        assert!(current.verify("pw", &old));
    }

    #[test]
    fn needs_rehash_when_iteration_count_differs() {
        let current = fast_hasher();
        assert!(!current.needs_rehash(&current.hash("pw")));
        assert!(current.needs_rehash(&PasswordHasher::new(500).hash("pw")));
        assert!(current.needs_rehash(&PasswordHash::from_stored("garbage".into())));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        let hasher = fast_hasher();
        for stored in [
            "",
            "plaintext",
            "pbkdf2:sha256:",
            "pbkdf2:sha256:0$00$00",
            "pbkdf2:sha256:1000$zz$00",
            "pbkdf2:sha256:1000$00$0011",
            "scrypt:32768:8:1$abc$def",
        ] {
            assert!(
                !hasher.verify("pw", &PasswordHash::from_stored(stored.to_string())),
                "{stored} should not verify"
            );
        }
    }

    #[test]
    fn debug_output_is_redacted() {
        let hash = fast_hasher().hash("secret");
        let printed = format!("{hash:?}");
        assert!(!printed.contains(hash.as_str()));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn zero_iterations_is_clamped() {
        assert_eq!(PasswordHasher::new(0).iterations(), 1);
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
