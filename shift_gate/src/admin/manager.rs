//! Admin elevation manager implementation.

use super::models::{AdminSession, ElevationRequest, IssuedAdminSession, NewAdminSession};
use crate::{
    audit::{AuditEventType, AuditRecorder, NewAuditEvent},
    auth::{ClientInfo, CredentialVerifier, OwnerId, TokenIssuer, token_digest},
    clock::SharedClock,
    config::AccessPolicy,
    db::{AdminSessionRepository, IdentityRepository},
    errors::{AccessError, AccessResult},
    security::LoginThrottle,
};
use serde_json::json;
use std::sync::Arc;

/// Issues and validates short-lived elevated sessions
///
/// Elevation is independent of shift state. Every session lives exactly
/// [`AccessPolicy::admin_session_ttl`] and is never renewed.
#[derive(Clone)]
pub struct AdminElevationManager {
    identities: Arc<dyn IdentityRepository>,
    sessions: Arc<dyn AdminSessionRepository>,
    verifier: Arc<CredentialVerifier>,
    tokens: TokenIssuer,
    throttle: LoginThrottle,
    audit: AuditRecorder,
    clock: SharedClock,
    policy: AccessPolicy,
}

impl AdminElevationManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        sessions: Arc<dyn AdminSessionRepository>,
        verifier: Arc<CredentialVerifier>,
        tokens: TokenIssuer,
        throttle: LoginThrottle,
        audit: AuditRecorder,
        clock: SharedClock,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            identities,
            sessions,
            verifier,
            tokens,
            throttle,
            audit,
            clock,
            policy,
        }
    }

    /// Verify password and admin PIN, then issue an elevated session
    ///
    /// Both factors are checked independently. Any failure returns the same
    /// `InvalidCredential`; which factor failed is only visible in the audit
    /// trail. A new session supersedes any active one for the same purpose.
    ///
    /// # Errors
    ///
    /// * `AccessError::InvalidInput` - Missing purpose
    /// * `AccessError::RateLimited` - Too many recent failures for this owner
    /// * `AccessError::InvalidCredential` - Unknown email, wrong password, wrong or unset PIN
    pub async fn request_elevation(
        &self,
        request: ElevationRequest,
        client: &ClientInfo,
    ) -> AccessResult<IssuedAdminSession> {
        let required_for = request.required_for.trim().to_string();
        if required_for.is_empty() {
            return Err(AccessError::InvalidInput(
                "required_for must not be empty".to_string(),
            ));
        }

        let Some(owner) = self.identities.find_owner_by_email(&request.email).await? else {
            // No owner id to attach an audit event to
            log::warn!("Elevation requested for unknown email");
            return Err(AccessError::InvalidCredential);
        };

        self.throttle.check(owner.id, "owner").await?;

        if !self.verifier.verify(&request.password, &owner.password_hash)? {
            self.record_failure(
                owner.id,
                AuditEventType::AdminPasswordFailed,
                &required_for,
                "invalid_password",
                client,
            )
            .await;
            return Err(AccessError::InvalidCredential);
        }

        let pin_ok = match owner.admin_pin_hash.as_deref() {
            Some(pin_hash) => self.verifier.verify(&request.admin_pin, pin_hash)?,
            None => false,
        };
        if !pin_ok {
            let reason = if owner.admin_pin_hash.is_some() {
                "invalid_pin"
            } else {
                "pin_not_configured"
            };
            self.record_failure(
                owner.id,
                AuditEventType::AdminPinFailed,
                &required_for,
                reason,
                client,
            )
            .await;
            return Err(AccessError::InvalidCredential);
        }

        for attempt in 1..=self.policy.token_retry_budget {
            let token = self.tokens.issue();
            let now = self.clock.now();
            let created = self
                .sessions
                .create_admin_session(NewAdminSession {
                    owner_id: owner.id,
                    token_hash: token.digest,
                    required_for: required_for.clone(),
                    issued_by: owner.email.clone(),
                    created_at: now,
                    expires_at: now + self.policy.admin_session_ttl,
                })
                .await;

            match created {
                Ok((session, superseded)) => {
                    log::info!(
                        "Admin session {} issued to owner {} for '{required_for}'",
                        session.id,
                        owner.id
                    );
                    self.audit
                        .record(
                            NewAuditEvent::new(owner.id, AuditEventType::AdminLoginSuccess)
                                .by_owner(owner.id)
                                .client(client)
                                .detail(json!({
                                    "session_id": session.id,
                                    "required_for": session.required_for,
                                    "expires_at": session.expires_at,
                                    "superseded": superseded,
                                })),
                        )
                        .await;

                    return Ok(IssuedAdminSession {
                        session,
                        token: token.plaintext,
                        owner,
                        superseded,
                    });
                }
                Err(AccessError::DuplicateToken) => {
                    log::warn!("Admin token collision on attempt {attempt}, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AccessError::DuplicateToken)
    }

    /// Session for a token iff it is active and `now < expires_at`
    ///
    /// Unknown, ended and expired tokens are indistinguishable to the caller.
    pub async fn validate(&self, token: &str) -> AccessResult<Option<AdminSession>> {
        let session = self
            .sessions
            .find_admin_session_by_token(&token_digest(token))
            .await?;

        Ok(session.filter(|s| s.is_valid_at(self.clock.now())))
    }

    /// End the session holding `token`
    ///
    /// Idempotent: an unknown or already-ended token returns `Ok(false)` and
    /// writes nothing to the audit trail.
    pub async fn end(&self, token: &str, client: &ClientInfo) -> AccessResult<bool> {
        let Some(session) = self
            .sessions
            .find_admin_session_by_token(&token_digest(token))
            .await?
        else {
            return Ok(false);
        };

        let ended = match self
            .sessions
            .end_admin_session(session.id, self.clock.now())
            .await
        {
            Ok(ended) => ended,
            Err(AccessError::NotFound(_)) => false,
            Err(e) => return Err(e),
        };

        if ended {
            self.audit
                .record(
                    NewAuditEvent::new(session.owner_id, AuditEventType::AdminLogout)
                        .by_owner(session.owner_id)
                        .client(client)
                        .detail(json!({
                            "session_id": session.id,
                            "required_for": session.required_for,
                        })),
                )
                .await;
        }
        Ok(ended)
    }

    /// Valid elevated sessions of an owner, newest first
    pub async fn active_sessions(&self, owner_id: OwnerId) -> AccessResult<Vec<AdminSession>> {
        self.sessions
            .list_active_admin_sessions(owner_id, self.clock.now())
            .await
    }

    async fn record_failure(
        &self,
        owner_id: OwnerId,
        event_type: AuditEventType,
        required_for: &str,
        reason: &str,
        client: &ClientInfo,
    ) {
        log::warn!("Elevation failed for owner {owner_id}: {reason}");
        self.audit
            .record(
                NewAuditEvent::new(owner_id, event_type)
                    .by_owner(owner_id)
                    .client(client)
                    .detail(json!({ "required_for": required_for, "reason": reason })),
            )
            .await;
    }
}
