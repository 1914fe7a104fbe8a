//! Opaque session tokens and numeric PINs.

use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generates session tokens and PINs from a CSPRNG
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    token_bytes: usize,
    pin_length: usize,
}

/// A freshly issued token and the digest that gets persisted
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Returned once to the client, never stored
    pub plaintext: String,
    /// SHA-256 hex digest of `plaintext`
    pub digest: String,
}

impl TokenIssuer {
    pub fn new(token_bytes: usize, pin_length: usize) -> Self {
        Self {
            token_bytes,
            pin_length,
        }
    }

    /// Generate a random opaque token
    pub fn issue(&self) -> IssuedToken {
        let mut bytes = vec![0u8; self.token_bytes];
        rand::rng().fill_bytes(&mut bytes);
        let plaintext = hex::encode(bytes);
        let digest = token_digest(&plaintext);
        IssuedToken { plaintext, digest }
    }

    /// Generate a fixed-length numeric PIN
    pub fn issue_pin(&self) -> String {
        let mut rng = rand::rng();
        (0..self.pin_length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new(32, 6)
    }
}

/// Digest under which a token is stored and looked up
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Constant-time comparison of two token digests
pub fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}
