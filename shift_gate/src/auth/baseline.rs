//! Owner baseline session tokens (JWT).

use super::{
    errors::CredentialResult,
    models::{OwnerClaims, OwnerIdentity},
};
use crate::clock::SharedClock;
use chrono::Duration;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Signs and verifies the owner's baseline session
#[derive(Clone)]
pub struct OwnerSessionIssuer {
    jwt_secret: String,
    ttl: Duration,
    clock: SharedClock,
}

impl OwnerSessionIssuer {
    /// Create a new issuer
    ///
    /// # Arguments
    ///
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `ttl` - Baseline session lifetime
    /// * `clock` - Time source for `iat`/`exp`
    pub fn new(jwt_secret: String, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            jwt_secret,
            ttl,
            clock,
        }
    }

    /// Issue a baseline session token for an authenticated owner
    pub fn issue(&self, owner: &OwnerIdentity) -> CredentialResult<String> {
        let now = self.clock.now();
        let claims = OwnerClaims {
            sub: owner.id,
            email: owner.email.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }

    /// Verify a baseline session token
    ///
    /// Expiry is checked against the injected clock rather than the wall clock.
    pub fn verify(&self, token: &str) -> CredentialResult<OwnerClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = false;

        let claims = decode::<OwnerClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )?
        .claims;

        if self.clock.now().timestamp() >= claims.exp {
            let expired =
                jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature);
            return Err(expired.into());
        }

        Ok(claims)
    }
}
