//! Owner baseline login.

use crate::{
    audit::{AuditEventType, AuditRecorder, NewAuditEvent},
    auth::{
        ClientInfo, CredentialVerifier, OwnerClaims, OwnerId, OwnerIdentity, OwnerSessionIssuer,
    },
    db::IdentityRepository,
    errors::{AccessError, AccessResult},
    security::LoginThrottle,
};
use serde_json::json;
use std::sync::Arc;

/// Baseline owner session with its signed token
#[derive(Debug, Clone)]
pub struct OwnerLogin {
    pub owner: OwnerIdentity,
    pub token: String,
}

/// Issues and checks the owner's baseline session
#[derive(Clone)]
pub struct OwnerSessions {
    identities: Arc<dyn IdentityRepository>,
    verifier: Arc<CredentialVerifier>,
    issuer: OwnerSessionIssuer,
    throttle: LoginThrottle,
    audit: AuditRecorder,
}

impl OwnerSessions {
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        verifier: Arc<CredentialVerifier>,
        issuer: OwnerSessionIssuer,
        throttle: LoginThrottle,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            identities,
            verifier,
            issuer,
            throttle,
            audit,
        }
    }

    /// Verify email and password and sign a baseline token
    ///
    /// # Errors
    ///
    /// * `AccessError::RateLimited` - Too many recent failures for this owner
    /// * `AccessError::InvalidCredential` - Unknown email or wrong password
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> AccessResult<OwnerLogin> {
        let Some(owner) = self.identities.find_owner_by_email(email).await? else {
            log::warn!("Owner login for unknown email");
            return Err(AccessError::InvalidCredential);
        };

        self.throttle.check(owner.id, "owner").await?;

        if !self.verifier.verify(password, &owner.password_hash)? {
            self.audit
                .record(
                    NewAuditEvent::new(owner.id, AuditEventType::OwnerLoginFailed)
                        .by_owner(owner.id)
                        .client(client)
                        .detail(json!({ "reason": "invalid_password" })),
                )
                .await;
            return Err(AccessError::InvalidCredential);
        }

        let token = self.issuer.issue(&owner)?;
        self.audit
            .record(
                NewAuditEvent::new(owner.id, AuditEventType::OwnerLoginSuccess)
                    .by_owner(owner.id)
                    .client(client),
            )
            .await;

        Ok(OwnerLogin { owner, token })
    }

    /// Business an owner id refers to
    pub async fn business(&self, owner_id: OwnerId) -> AccessResult<Option<OwnerIdentity>> {
        self.identities.find_owner(owner_id).await
    }

    /// Claims of a valid baseline token. Bad signatures and expiry both give `None`.
    pub fn verify(&self, token: &str) -> Option<OwnerClaims> {
        self.issuer.verify(token).ok()
    }
}
