//! Shared fixtures for integration tests.
//!
//! Everything runs against the in-memory store with a manual clock, and with
//! the cheapest Argon2 parameters so tests stay fast.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use shift_gate::{
    AccessServices, ServiceSettings,
    audit::{AuditEvent, AuditEventType},
    auth::{ClientInfo, CredentialVerifier, OwnerIdentity, StaffIdentity, StaffRole},
    clock::ManualClock,
    config::{AccessPolicy, CredentialConfig, LockoutConfig},
    db::MemoryStore,
    shift::{Shift, StartShiftRequest},
    staff::{IssuedStaffSession, StaffLoginRequest},
};
use std::sync::Arc;
use uuid::Uuid;

pub const PEPPER: &str = "integration_test_pepper";
pub const OWNER_EMAIL: &str = "owner@cornercafe.test";
pub const OWNER_PASSWORD: &str = "correct horse battery staple";
pub const ADMIN_PIN: &str = "246810";
pub const JWT_SECRET: &str = "integration_test_jwt_secret_32_chars!";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub services: AccessServices,
    pub owner: OwnerIdentity,
    pub verifier: CredentialVerifier,
}

/// A staff member seeded with a known PIN
pub struct SeededStaff {
    pub identity: StaffIdentity,
    pub pin: String,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 17, 0, 0).unwrap()
}

pub fn client() -> ClientInfo {
    ClientInfo::new(Some("203.0.113.7".to_string()), Some("test-agent".to_string()))
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_lockout(LockoutConfig::default()).await
    }

    pub async fn with_lockout(lockout: LockoutConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(start_time());
        let credentials = CredentialConfig::insecure_fast(PEPPER);
        let verifier = CredentialVerifier::new(&credentials).unwrap();

        let services = AccessServices::new(
            store.clone(),
            Arc::new(clock.clone()),
            ServiceSettings {
                policy: AccessPolicy::default(),
                credentials,
                lockout,
                jwt_secret: JWT_SECRET.to_string(),
            },
        )
        .unwrap();

        let owner = OwnerIdentity {
            id: Uuid::new_v4(),
            email: OWNER_EMAIL.to_string(),
            display_name: "Dana Owner".to_string(),
            business_name: "Corner Cafe".to_string(),
            password_hash: verifier.hash(OWNER_PASSWORD).unwrap(),
            admin_pin_hash: Some(verifier.hash(ADMIN_PIN).unwrap()),
            created_at: start_time(),
        };
        store.insert_owner(owner.clone()).await;

        Self {
            store,
            clock,
            services,
            owner,
            verifier,
        }
    }

    pub async fn add_staff(&self, name: &str, pin: &str) -> SeededStaff {
        let identity = StaffIdentity {
            id: Uuid::new_v4(),
            owner_id: self.owner.id,
            display_name: name.to_string(),
            pin_hash: self.verifier.hash(pin).unwrap(),
            role: StaffRole::Cashier,
            is_active: true,
        };
        self.store.insert_staff(identity.clone()).await;
        SeededStaff {
            identity,
            pin: pin.to_string(),
        }
    }

    pub async fn start_shift(&self, name: &str, max: u32, auto_end_hours: Option<u32>) -> Shift {
        self.services
            .shifts
            .start(
                self.owner.id,
                &self.owner.email,
                StartShiftRequest {
                    name: name.to_string(),
                    max_staff_sessions: Some(max),
                    auto_end_hours,
                },
                &client(),
            )
            .await
            .unwrap()
    }

    pub fn login_request(&self, staff: &SeededStaff) -> StaffLoginRequest {
        StaffLoginRequest {
            owner_id: self.owner.id,
            staff_id: staff.identity.id,
            pin: staff.pin.clone(),
        }
    }

    pub async fn login(
        &self,
        staff: &SeededStaff,
    ) -> shift_gate::AccessResult<IssuedStaffSession> {
        self.services
            .staff
            .login(self.login_request(staff), &client())
            .await
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.store.all_audit_events().await
    }

    pub async fn events_of(&self, event_type: AuditEventType) -> Vec<AuditEvent> {
        self.events()
            .await
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }
}
