//! Wiring of every manager over one repository handle.

use crate::{
    activity::ActivityTelemetry,
    admin::AdminElevationManager,
    audit::AuditRecorder,
    auth::{CredentialResult, CredentialVerifier, OwnerSessionIssuer, TokenIssuer},
    clock::SharedClock,
    config::{AccessPolicy, CredentialConfig, LockoutConfig},
    db::Store,
    gate::{ModeGate, OwnerSessions},
    security::LoginThrottle,
    shift::ShiftManager,
    staff::StaffSessionPool,
};
use std::sync::Arc;

/// Settings needed to build [`AccessServices`]
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub policy: AccessPolicy,
    pub credentials: CredentialConfig,
    pub lockout: LockoutConfig,
    pub jwt_secret: String,
}

/// Every admission-control component, sharing one store and one clock
#[derive(Clone)]
pub struct AccessServices {
    pub verifier: Arc<CredentialVerifier>,
    pub tokens: TokenIssuer,
    pub audit: AuditRecorder,
    pub throttle: LoginThrottle,
    pub owners: OwnerSessions,
    pub shifts: ShiftManager,
    pub staff: StaffSessionPool,
    pub admin: AdminElevationManager,
    pub activity: ActivityTelemetry,
    pub gate: ModeGate,
    pub clock: SharedClock,
}

impl AccessServices {
    /// Build all managers over `store`
    ///
    /// # Errors
    ///
    /// Fails only if the Argon2 parameters are rejected.
    pub fn new<S>(
        store: Arc<S>,
        clock: SharedClock,
        settings: ServiceSettings,
    ) -> CredentialResult<Self>
    where
        S: Store + 'static,
    {
        let ServiceSettings {
            policy,
            credentials,
            lockout,
            jwt_secret,
        } = settings;

        let verifier = Arc::new(CredentialVerifier::new(&credentials)?);
        let tokens = TokenIssuer::new(policy.token_bytes, policy.pin_length);
        let audit = AuditRecorder::new(store.clone(), clock.clone());
        let throttle = LoginThrottle::new(store.clone(), clock.clone(), lockout);

        let owners = OwnerSessions::new(
            store.clone(),
            verifier.clone(),
            OwnerSessionIssuer::new(jwt_secret, policy.owner_session_ttl, clock.clone()),
            throttle.clone(),
            audit.clone(),
        );
        let shifts = ShiftManager::new(store.clone(), audit.clone(), clock.clone(), policy.clone());
        let staff = StaffSessionPool::new(
            store.clone(),
            store.clone(),
            shifts.clone(),
            verifier.clone(),
            tokens.clone(),
            throttle.clone(),
            audit.clone(),
            clock.clone(),
            policy.clone(),
        );
        let admin = AdminElevationManager::new(
            store.clone(),
            store.clone(),
            verifier.clone(),
            tokens.clone(),
            throttle.clone(),
            audit.clone(),
            clock.clone(),
            policy,
        );
        let activity = ActivityTelemetry::new(store.clone(), store, clock.clone());
        let gate = ModeGate::new(owners.clone(), admin.clone(), staff.clone());

        Ok(Self {
            verifier,
            tokens,
            audit,
            throttle,
            owners,
            shifts,
            staff,
            admin,
            activity,
            gate,
            clock,
        })
    }
}
