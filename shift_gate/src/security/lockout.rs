//! Failed-login lockout derived from the audit trail.
//!
//! The throttle keeps no state. Each check counts the actor's recent
//! credential-failure events, so it behaves the same across every handler
//! instance sharing the datastore.

use crate::{
    audit::AuditEventType,
    auth::OwnerId,
    clock::SharedClock,
    config::LockoutConfig,
    db::AuditRepository,
    errors::{AccessError, AccessResult},
};
use chrono::Duration;
use std::sync::Arc;

/// Rate limit check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutStatus {
    /// Attempt allowed
    Allowed { remaining: u64 },

    /// Too many recent failures
    Locked { retry_after: u64 },
}

impl LockoutStatus {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LockoutStatus::Allowed { .. })
    }
}

/// Counts `*_failed` audit events per (owner, actor) inside a sliding window
#[derive(Clone)]
pub struct LoginThrottle {
    audit: Arc<dyn AuditRepository>,
    clock: SharedClock,
    config: LockoutConfig,
}

impl LoginThrottle {
    pub fn new(audit: Arc<dyn AuditRepository>, clock: SharedClock, config: LockoutConfig) -> Self {
        Self {
            audit,
            clock,
            config,
        }
    }

    /// Current lockout state for an actor
    ///
    /// # Arguments
    ///
    /// * `owner_id` - Tenant the attempt is made against
    /// * `actor` - `"owner"` or the staff id, as recorded on audit events
    pub async fn status(&self, owner_id: OwnerId, actor: &str) -> AccessResult<LockoutStatus> {
        let since = self.clock.now() - Duration::seconds(self.config.window_secs);
        let failures = self
            .audit
            .count_events_since(owner_id, actor, &AuditEventType::CREDENTIAL_FAILURES, since)
            .await?;

        if failures >= self.config.max_failures {
            Ok(LockoutStatus::Locked {
                retry_after: self.config.window_secs.max(0) as u64,
            })
        } else {
            Ok(LockoutStatus::Allowed {
                remaining: self.config.max_failures - failures,
            })
        }
    }

    /// Fail fast with `RateLimited` when the actor is locked out
    pub async fn check(&self, owner_id: OwnerId, actor: &str) -> AccessResult<()> {
        match self.status(owner_id, actor).await? {
            LockoutStatus::Allowed { .. } => Ok(()),
            LockoutStatus::Locked { retry_after } => {
                log::warn!("Login locked out for actor {actor} of owner {owner_id}");
                Err(AccessError::RateLimited {
                    retry_after_secs: retry_after,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audit::NewAuditEvent,
        clock::{Clock, ManualClock},
        db::MemoryStore,
    };
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_locks_after_threshold_and_expires_with_window() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(Utc::now());
        let throttle = LoginThrottle::new(
            store.clone(),
            Arc::new(clock.clone()),
            LockoutConfig {
                max_failures: 2,
                window_secs: 60,
            },
        );
        let owner = Uuid::new_v4();

        assert_eq!(
            throttle.status(owner, "owner").await.unwrap(),
            LockoutStatus::Allowed { remaining: 2 }
        );

        for _ in 0..2 {
            store
                .append_event(
                    NewAuditEvent::new(owner, AuditEventType::AdminPinFailed).by_owner(owner),
                    clock.now(),
                )
                .await
                .unwrap();
        }

        assert!(matches!(
            throttle.check(owner, "owner").await,
            Err(AccessError::RateLimited { retry_after_secs: 60 })
        ));

        // Failures by another actor don't count
        assert!(throttle.check(owner, "someone-else").await.is_ok());

        clock.advance(Duration::seconds(61));
        assert!(throttle.check(owner, "owner").await.is_ok());
    }
}
