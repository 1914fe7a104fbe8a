//! Staff session admission, validation and eviction.

use super::models::{
    Admission, IssuedStaffSession, NewStaffSession, SessionSelector, StaffLoginRequest,
    StaffSession, TerminatedSession, TerminationReason, Terminator,
};
use crate::{
    audit::{AuditEventType, AuditRecorder, NewAuditEvent},
    auth::{ClientInfo, CredentialVerifier, OwnerId, TokenIssuer, token_digest},
    clock::SharedClock,
    config::AccessPolicy,
    db::{IdentityRepository, StaffSessionRepository},
    errors::{AccessError, AccessResult},
    security::LoginThrottle,
    shift::ShiftManager,
};
use serde_json::json;
use std::sync::Arc;

/// Staff session pool
#[derive(Clone)]
pub struct StaffSessionPool {
    identities: Arc<dyn IdentityRepository>,
    sessions: Arc<dyn StaffSessionRepository>,
    shifts: ShiftManager,
    verifier: Arc<CredentialVerifier>,
    tokens: TokenIssuer,
    throttle: LoginThrottle,
    audit: AuditRecorder,
    clock: SharedClock,
    policy: AccessPolicy,
}

impl StaffSessionPool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        sessions: Arc<dyn StaffSessionRepository>,
        shifts: ShiftManager,
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
            shifts,
            verifier,
            tokens,
            throttle,
            audit,
            clock,
            policy,
        }
    }

    /// Admit a staff member into the owner's open shift
    ///
    /// The shift and capacity pre-check gives a fast, typed rejection before
    /// the PIN is hashed. The authoritative check happens again inside the
    /// atomic insert, so a concurrent login or shift end cannot overshoot.
    ///
    /// # Errors
    ///
    /// * `AccessError::NotFound` - Unknown or inactive staff member
    /// * `AccessError::NoActiveShift` - Owner has no open shift
    /// * `AccessError::CapacityExceeded` - Shift is full
    /// * `AccessError::RateLimited` - Too many recent PIN failures
    /// * `AccessError::InvalidCredential` - Wrong PIN
    pub async fn login(
        &self,
        request: StaffLoginRequest,
        client: &ClientInfo,
    ) -> AccessResult<IssuedStaffSession> {
        let StaffLoginRequest {
            owner_id,
            staff_id,
            pin,
        } = request;

        let staff = match self.identities.find_staff(owner_id, staff_id).await? {
            Some(staff) if staff.is_active => staff,
            found => {
                let reason = if found.is_some() { "inactive" } else { "unknown_staff" };
                self.audit
                    .record(
                        NewAuditEvent::new(owner_id, AuditEventType::StaffLoginFailed)
                            .client(client)
                            .detail(json!({ "staff_id": staff_id, "reason": reason })),
                    )
                    .await;
                return Err(AccessError::NotFound("staff member"));
            }
        };

        let status = self.shifts.status(owner_id).await?;
        if !status.is_active {
            self.record_rejection(owner_id, staff_id, "no_active_shift", client)
                .await;
            return Err(AccessError::NoActiveShift);
        }
        if !status.has_capacity() {
            self.record_rejection(owner_id, staff_id, "capacity_exceeded", client)
                .await;
            return Err(AccessError::CapacityExceeded {
                max: status.max_staff_allowed,
            });
        }

        self.throttle.check(owner_id, &staff_id.to_string()).await?;

        if !self.verifier.verify(&pin, &staff.pin_hash)? {
            self.audit
                .record(
                    NewAuditEvent::new(owner_id, AuditEventType::StaffLoginFailed)
                        .by_staff(staff_id)
                        .client(client)
                        .detail(json!({ "reason": "invalid_pin" })),
                )
                .await;
            return Err(AccessError::InvalidCredential);
        }

        for attempt in 1..=self.policy.token_retry_budget {
            let token = self.tokens.issue();
            let admission = self
                .sessions
                .admit_staff_session(NewStaffSession {
                    staff_id,
                    owner_id,
                    token_hash: token.digest,
                    signed_in_at: self.clock.now(),
                    ttl: self.policy.staff_session_ttl,
                })
                .await;

            match admission {
                Ok(Admission::Admitted(session)) => {
                    log::info!(
                        "Staff {staff_id} signed in to shift {:?} for owner {owner_id}",
                        session.shift_id
                    );
                    self.audit
                        .record(
                            NewAuditEvent::new(owner_id, AuditEventType::StaffLoginSuccess)
                                .by_staff(staff_id)
                                .client(client)
                                .detail(json!({
                                    "session_id": session.id,
                                    "shift_id": session.shift_id,
                                    "role": staff.role,
                                    "expires_at": session.expires_at,
                                })),
                        )
                        .await;
                    return Ok(IssuedStaffSession {
                        session,
                        token: token.plaintext,
                    });
                }
                Ok(Admission::NoActiveShift) => {
                    self.record_rejection(owner_id, staff_id, "no_active_shift", client)
                        .await;
                    return Err(AccessError::NoActiveShift);
                }
                Ok(Admission::CapacityExceeded { max }) => {
                    self.record_rejection(owner_id, staff_id, "capacity_exceeded", client)
                        .await;
                    return Err(AccessError::CapacityExceeded { max });
                }
                Err(AccessError::DuplicateToken) => {
                    log::warn!("Staff token collision on attempt {attempt}, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AccessError::DuplicateToken)
    }

    /// Session for a token, if it is still usable
    ///
    /// Valid iff the session is active, unexpired and its shift is still open.
    /// An expired shift is swept here, which closes the session as well.
    /// Unknown, expired and ended sessions all come back as `None`.
    pub async fn validate(&self, token: &str) -> AccessResult<Option<StaffSession>> {
        let Some(session) = self
            .sessions
            .find_staff_session_by_token(&token_digest(token))
            .await?
        else {
            return Ok(None);
        };

        let (true, Some(shift_id)) = (session.is_active, session.shift_id) else {
            return Ok(None);
        };

        // Sweep before the liveness check: a session capped at the shift
        // deadline is already past `expires_at` when the shift expires
        match self.shifts.find(shift_id).await? {
            Some(shift) if shift.is_active => {}
            _ => return Ok(None),
        }

        Ok(Some(session).filter(|s| s.is_live_at(self.clock.now())))
    }

    /// Sign out the session holding `token`
    ///
    /// Unknown tokens and sessions that already ended are a no-op success.
    pub async fn logout(
        &self,
        token: &str,
        client: &ClientInfo,
    ) -> AccessResult<Option<TerminatedSession>> {
        let Some(session) = self
            .sessions
            .find_staff_session_by_token(&token_digest(token))
            .await?
        else {
            return Ok(None);
        };

        let mut ended = self
            .end(
                session.owner_id,
                &SessionSelector::One(session.id),
                TerminationReason::SelfSignout,
                Terminator::Staff(session.staff_id),
                client,
            )
            .await?;
        Ok(ended.pop())
    }

    /// End sessions on behalf of a staff member or the owner
    ///
    /// The reason is derived from who ends the sessions and how many were
    /// selected. Sessions that already ended are skipped without an audit event.
    ///
    /// # Errors
    ///
    /// * `AccessError::NotFound` - `SessionSelector::One` names no session of this owner
    pub async fn terminate(
        &self,
        owner_id: OwnerId,
        selector: SessionSelector,
        terminator: Terminator,
        client: &ClientInfo,
    ) -> AccessResult<Vec<TerminatedSession>> {
        let reason = match (&terminator, &selector) {
            (Terminator::Staff(_), _) => TerminationReason::SelfSignout,
            (Terminator::Owner(_), SessionSelector::One(_)) => TerminationReason::OwnerSignout,
            (Terminator::Owner(_), SessionSelector::Many(_)) => TerminationReason::OwnerBulkSignout,
            (Terminator::Owner(_), SessionSelector::AllForOwner) => {
                TerminationReason::OwnerSignoutAll
            }
        };

        let ended = self
            .end(owner_id, &selector, reason, terminator, client)
            .await?;

        if let (SessionSelector::One(session_id), true) = (&selector, ended.is_empty()) {
            match self.sessions.find_staff_session(*session_id).await? {
                Some(session) if session.owner_id == owner_id => {}
                _ => return Err(AccessError::NotFound("staff session")),
            }
        }

        Ok(ended)
    }

    /// End a staff session because the client is leaving staff mode
    pub async fn end_for_switch_to_admin(
        &self,
        session: &StaffSession,
        client: &ClientInfo,
    ) -> AccessResult<Option<TerminatedSession>> {
        let mut ended = self
            .end(
                session.owner_id,
                &SessionSelector::One(session.id),
                TerminationReason::SwitchToAdmin,
                Terminator::Staff(session.staff_id),
                client,
            )
            .await?;
        Ok(ended.pop())
    }

    /// Live sessions of an owner, oldest first
    pub async fn list_live(&self, owner_id: OwnerId) -> AccessResult<Vec<StaffSession>> {
        self.shifts.sweep(owner_id).await?;
        self.sessions
            .list_live_staff_sessions(owner_id, self.clock.now())
            .await
    }

    async fn end(
        &self,
        owner_id: OwnerId,
        selector: &SessionSelector,
        reason: TerminationReason,
        terminator: Terminator,
        client: &ClientInfo,
    ) -> AccessResult<Vec<TerminatedSession>> {
        let now = self.clock.now();
        let ended = self
            .sessions
            .end_staff_sessions(owner_id, selector, reason, now)
            .await?;

        let mut terminated = Vec::with_capacity(ended.len());
        for session in ended {
            let duration_secs = session.duration_secs(now);

            let mut event = NewAuditEvent::new(owner_id, reason.audit_event())
                .by_staff(session.staff_id)
                .client(client)
                .detail(json!({
                    "session_id": session.id,
                    "shift_id": session.shift_id,
                    "termination_reason": reason,
                    "duration_secs": duration_secs,
                }));
            if let Terminator::Owner(by) = terminator {
                event = event.by_owner(by);
            }
            self.audit.record(event).await;

            terminated.push(TerminatedSession {
                session,
                duration_secs,
            });
        }

        if !terminated.is_empty() {
            log::info!(
                "Ended {} staff session(s) for owner {owner_id}: {reason}",
                terminated.len()
            );
        }
        Ok(terminated)
    }

    async fn record_rejection(
        &self,
        owner_id: OwnerId,
        staff_id: crate::auth::StaffId,
        reason: &str,
        client: &ClientInfo,
    ) {
        self.audit
            .record(
                NewAuditEvent::new(owner_id, AuditEventType::StaffLoginRejected)
                    .by_staff(staff_id)
                    .client(client)
                    .detail(json!({ "reason": reason })),
            )
            .await;
    }
}
