//! Password and PIN hashing.
//!
//! Every secret, whether an owner password, an elevation PIN or a staff PIN,
//! goes through the same Argon2id + pepper scheme. There is no second,
//! faster path.

use super::errors::{CredentialError, CredentialResult};
use crate::config::CredentialConfig;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

/// Verifies presented secrets against stored hashes
///
/// Side-effect free: no lockout counters live here. See
/// [`LoginThrottle`](crate::security::LoginThrottle) for that policy.
#[derive(Clone)]
pub struct CredentialVerifier {
    pepper: String,
    params: Params,
}

impl CredentialVerifier {
    /// Create a new verifier
    ///
    /// # Errors
    ///
    /// * `CredentialError::InvalidParams` - Argon2 rejected the cost parameters
    pub fn new(config: &CredentialConfig) -> CredentialResult<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| CredentialError::InvalidParams(e.to_string()))?;

        Ok(Self {
            pepper: config.pepper.clone(),
            params,
        })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a secret with a fresh salt
    pub fn hash(&self, secret: &str) -> CredentialResult<String> {
        let peppered = format!("{}{}", secret, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| CredentialError::HashingFailed)?
            .to_string())
    }

    /// Verify a secret against a stored hash
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Secret matches
    /// * `Ok(false)` - Secret doesn't match
    ///
    /// # Errors
    ///
    /// * `CredentialError::MalformedHash` - Stored hash can't be parsed
    pub fn verify(&self, secret: &str, stored_hash: &str) -> CredentialResult<bool> {
        let parsed = PasswordHash::new(stored_hash).map_err(|_| CredentialError::MalformedHash)?;
        let peppered = format!("{}{}", secret, self.pepper);

        // Cost parameters are read from the stored hash, not from self
        match self.argon2().verify_password(peppered.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(_) => Err(CredentialError::MalformedHash),
        }
    }
}
