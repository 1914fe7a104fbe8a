//! Access policy configuration.
//!
//! Provides the tunables for session lifetimes, credential hashing cost and
//! login lockout. Every value can be overridden from the environment.

use chrono::Duration;

/// Elevated admin sessions live exactly this long and are never extended
pub const ADMIN_SESSION_TTL_MINUTES: i64 = 15;

/// Default shift capacity when the owner doesn't specify one
pub const DEFAULT_MAX_STAFF_SESSIONS: u32 = 50;

/// Session lifetime and token policy
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    /// Lifetime of an elevated admin session
    pub admin_session_ttl: Duration,

    /// Upper bound on a staff session's lifetime
    pub staff_session_ttl: Duration,

    /// Lifetime of the owner's baseline session token
    pub owner_session_ttl: Duration,

    /// Capacity applied when a shift is started without one
    pub default_max_staff_sessions: u32,

    /// Random bytes per opaque token
    pub token_bytes: usize,

    /// Digits in a generated numeric PIN
    pub pin_length: usize,

    /// Attempts to issue a unique token before giving up
    pub token_retry_budget: u32,
}

impl AccessPolicy {
    /// Create policy from environment variables
    ///
    /// Expected environment variables:
    /// - `STAFF_SESSION_TTL_HOURS`: Staff session upper bound (default: 12)
    /// - `OWNER_SESSION_HOURS`: Baseline owner session lifetime (default: 12)
    /// - `DEFAULT_MAX_STAFF_SESSIONS`: Default shift capacity (default: 50)
    ///
    /// The admin elevation lifetime is fixed and cannot be configured.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            staff_session_ttl: Duration::hours(parse_env_or("STAFF_SESSION_TTL_HOURS", 12)),
            owner_session_ttl: Duration::hours(parse_env_or("OWNER_SESSION_HOURS", 12)),
            default_max_staff_sessions: parse_env_or(
                "DEFAULT_MAX_STAFF_SESSIONS",
                DEFAULT_MAX_STAFF_SESSIONS,
            ),
            ..defaults
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            admin_session_ttl: Duration::minutes(ADMIN_SESSION_TTL_MINUTES),
            staff_session_ttl: Duration::hours(12),
            owner_session_ttl: Duration::hours(12),
            default_max_staff_sessions: DEFAULT_MAX_STAFF_SESSIONS,
            token_bytes: 32,
            pin_length: 6,
            token_retry_budget: 3,
        }
    }
}

/// Credential hashing configuration
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    /// Server-side pepper appended to every secret before hashing
    pub pepper: String,

    /// Argon2id memory cost in KiB
    pub memory_kib: u32,

    /// Argon2id iteration count
    pub iterations: u32,

    /// Argon2id lanes
    pub parallelism: u32,
}

impl CredentialConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `ARGON2_MEMORY_KIB` (default: 19456)
    /// - `ARGON2_ITERATIONS` (default: 2)
    /// - `ARGON2_PARALLELISM` (default: 1)
    pub fn from_env(pepper: String) -> Self {
        Self {
            pepper,
            memory_kib: parse_env_or("ARGON2_MEMORY_KIB", 19_456),
            iterations: parse_env_or("ARGON2_ITERATIONS", 2),
            parallelism: parse_env_or("ARGON2_PARALLELISM", 1),
        }
    }

    /// Cheapest parameters Argon2 accepts. Only for tests and local demos.
    pub fn insecure_fast(pepper: &str) -> Self {
        Self {
            pepper: pepper.to_string(),
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Failed-login lockout configuration
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Failures tolerated inside the window
    pub max_failures: u64,

    /// Sliding window in seconds
    pub window_secs: i64,
}

impl LockoutConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `LOCKOUT_MAX_FAILURES` (default: 5)
    /// - `LOCKOUT_WINDOW_SECS` (default: 900)
    pub fn from_env() -> Self {
        Self {
            max_failures: parse_env_or("LOCKOUT_MAX_FAILURES", 5),
            window_secs: parse_env_or("LOCKOUT_WINDOW_SECS", 900),
        }
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_secs: 900,
        }
    }
}

fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_admin_ttl_is_fixed() {
        let policy = AccessPolicy::default();
        assert_eq!(policy.admin_session_ttl, Duration::minutes(15));
    }

    #[test]
    #[serial]
    fn test_policy_from_env_overrides() {
        // SAFETY: serialized with the other env-mutating tests
        unsafe {
            std::env::set_var("STAFF_SESSION_TTL_HOURS", "8");
            std::env::set_var("DEFAULT_MAX_STAFF_SESSIONS", "20");
        }

        let policy = AccessPolicy::from_env();
        assert_eq!(policy.staff_session_ttl, Duration::hours(8));
        assert_eq!(policy.default_max_staff_sessions, 20);
        assert_eq!(policy.admin_session_ttl, Duration::minutes(15));

        unsafe {
            std::env::remove_var("STAFF_SESSION_TTL_HOURS");
            std::env::remove_var("DEFAULT_MAX_STAFF_SESSIONS");
        }
    }

    #[test]
    #[serial]
    fn test_lockout_from_env_falls_back_on_garbage() {
        unsafe {
            std::env::set_var("LOCKOUT_MAX_FAILURES", "not-a-number");
        }

        let config = LockoutConfig::from_env();
        assert_eq!(config.max_failures, 5);

        unsafe {
            std::env::remove_var("LOCKOUT_MAX_FAILURES");
        }
    }
}
