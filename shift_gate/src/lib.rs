//! # Shift Gate
//!
//! Session and shift admission control for a single tenant's operational data.
//!
//! Three kinds of access are issued and governed here: the owner's baseline
//! session, a time-boxed elevated admin session required for sensitive
//! operations, and a pool of short-lived staff sessions that may only exist
//! while the owner has a work shift open.
//!
//! ## Architecture
//!
//! Components, leaf first:
//!
//! - **Credential Verifier** / **Token Issuer** ([`auth`]): Argon2id hashing with
//!   a pepper, opaque random tokens stored only as SHA-256 digests, numeric PINs
//! - **Audit Recorder** ([`audit`]): best-effort, append-only event trail
//! - **Shift Manager** ([`shift`]): one active shift per owner, capacity,
//!   auto-end deadline with lazy sweep, end cascade
//! - **Staff Session Pool** ([`staff`]): PIN login admitted atomically against
//!   the open shift's capacity
//! - **Admin Elevation Manager** ([`admin`]): password + admin PIN, 15 minute
//!   sessions that are never extended
//! - **Mode-Exclusivity Gate** ([`gate`]): owner mode or staff mode, never both
//! - **Activity Telemetry** ([`activity`]): per-session usage and productivity score
//!
//! All state lives behind the repository traits in [`db`]; expiry is always
//! judged against an injected [`clock::Clock`].
//!
//! ## Example
//!
//! ```
//! use shift_gate::{
//!     AccessServices, ServiceSettings,
//!     clock::SystemClock,
//!     config::{AccessPolicy, CredentialConfig, LockoutConfig},
//!     db::MemoryStore,
//! };
//! use std::sync::Arc;
//!
//! let services = AccessServices::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(SystemClock),
//!     ServiceSettings {
//!         policy: AccessPolicy::default(),
//!         credentials: CredentialConfig::insecure_fast("pepper"),
//!         lockout: LockoutConfig::default(),
//!         jwt_secret: "an_example_secret_of_at_least_32_chars".to_string(),
//!     },
//! )
//! .unwrap();
//! # let _ = services;
//! ```

/// Activity telemetry and productivity scoring.
pub mod activity;

/// Admin elevation sessions.
pub mod admin;

/// Audit trail.
pub mod audit;

/// Credential verification, tokens and owner baseline sessions.
pub mod auth;

/// Injectable time source.
pub mod clock;

/// Policy, hashing and lockout configuration.
pub mod config;

/// Persistence: pool, repository traits, PostgreSQL and in-memory stores.
pub mod db;

/// Error taxonomy.
pub mod errors;

/// Mode-exclusivity gate.
pub mod gate;

/// Login lockout.
pub mod security;

/// Component wiring.
pub mod services;

/// Shift lifecycle.
pub mod shift;

/// Staff session pool.
pub mod staff;

pub use errors::{AccessError, AccessResult};
pub use services::{AccessServices, ServiceSettings};
