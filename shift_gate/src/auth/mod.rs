//! Credential primitives: verification, token issuance, baseline sessions.
//!
//! This module implements the leaves every session manager builds on:
//! - Argon2id hashing with a server-side pepper for passwords and PINs
//! - Opaque random session tokens, stored only as SHA-256 digests
//! - Fixed-length numeric PINs
//! - JWT baseline sessions for the tenant owner
//!
//! ## Example
//!
//! ```
//! use shift_gate::auth::{CredentialVerifier, TokenIssuer};
//! use shift_gate::config::CredentialConfig;
//!
//! let verifier = CredentialVerifier::new(&CredentialConfig::insecure_fast("pepper")).unwrap();
//! let hash = verifier.hash("4821").unwrap();
//! assert!(verifier.verify("4821", &hash).unwrap());
//!
//! let token = TokenIssuer::default().issue();
//! assert_eq!(token.plaintext.len(), 64);
//! ```

pub mod baseline;
pub mod credentials;
pub mod errors;
pub mod models;
pub mod tokens;

pub use baseline::OwnerSessionIssuer;
pub use credentials::CredentialVerifier;
pub use errors::{CredentialError, CredentialResult};
pub use models::{
    ClientInfo, OwnerClaims, OwnerId, OwnerIdentity, StaffId, StaffIdentity, StaffRole,
};
pub use tokens::{IssuedToken, TokenIssuer, digests_match, token_digest};
