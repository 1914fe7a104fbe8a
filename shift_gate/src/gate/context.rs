//! Explicit per-request client context.
//!
//! Handlers never look up the current mode from ambient state. The transport
//! builds a [`ClientContext`] from whatever tokens the client presented, the
//! gate resolves it once, and the result is passed along.

use crate::{
    admin::AdminSession,
    auth::{OwnerClaims, OwnerId},
    staff::StaffSession,
};

/// Which hat the client is wearing for this request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Baseline owner session, optionally elevated
    Owner,
    /// Live staff session
    Staff,
    /// Nothing valid presented
    None,
}

/// Raw tokens attached to a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub owner_token: Option<String>,
    pub admin_token: Option<String>,
    pub staff_token: Option<String>,
}

impl ClientContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner_token(mut self, token: impl Into<String>) -> Self {
        self.owner_token = Some(token.into());
        self
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    pub fn with_staff_token(mut self, token: impl Into<String>) -> Self {
        self.staff_token = Some(token.into());
        self
    }
}

/// Client context after every presented token has been validated
///
/// A `stale_*` flag is set when a token was presented but did not validate;
/// the gate turns those into clear directives.
#[derive(Debug, Clone, Default)]
pub struct ResolvedContext {
    pub owner: Option<OwnerClaims>,
    pub admin: Option<AdminSession>,
    pub staff: Option<StaffSession>,
    pub stale_owner_token: bool,
    pub stale_admin_token: bool,
    pub stale_staff_token: bool,
}

impl ResolvedContext {
    /// Staff mode wins whenever a live staff session is present
    pub fn mode(&self) -> Mode {
        if self.staff.is_some() {
            Mode::Staff
        } else if self.owner.is_some() || self.admin.is_some() {
            Mode::Owner
        } else {
            Mode::None
        }
    }

    /// Owner the request acts for, from whichever valid session is present
    pub fn owner_id(&self) -> Option<OwnerId> {
        self.staff
            .as_ref()
            .map(|s| s.owner_id)
            .or_else(|| self.admin.as_ref().map(|a| a.owner_id))
            .or_else(|| self.owner.as_ref().map(|o| o.sub))
    }
}
