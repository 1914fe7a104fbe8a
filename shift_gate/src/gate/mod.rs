//! Mode-exclusivity gate.
//!
//! A client context acts either as the owner (baseline session, optionally
//! elevated) or as staff, never both. The gate resolves the tokens a request
//! carries into a [`ResolvedContext`], then [`decide`] maps a route class and
//! that context to a [`GateDecision`]. Storage may hold an admin session and a
//! staff session for the same device at once; exclusivity is enforced here, by
//! clearing the other token whenever one mode is entered.
//!
//! ## Example
//!
//! ```
//! use shift_gate::gate::{GateDecision, Mode, ResolvedContext, RouteClass, decide};
//!
//! let anonymous = ResolvedContext::default();
//! assert!(matches!(
//!     decide(RouteClass::Public, &anonymous),
//!     GateDecision::Proceed { mode: Mode::None, .. }
//! ));
//! ```

pub mod context;
pub mod owner;
pub mod policy;

pub use context::{ClientContext, Mode, ResolvedContext};
pub use owner::{OwnerLogin, OwnerSessions};
pub use policy::{
    AFTER_ADMIN_LOGIN, AFTER_STAFF_LOGIN, DenyReason, Directive, GateDecision, ON_SWITCH_TO_ADMIN,
    OWNER_LOGIN_PATH, RouteClass, decide,
};

use crate::{
    admin::AdminElevationManager,
    auth::ClientInfo,
    errors::AccessResult,
    staff::{StaffSessionPool, TerminatedSession},
};

/// Resolves client contexts and performs mode transitions
#[derive(Clone)]
pub struct ModeGate {
    owners: OwnerSessions,
    admin: AdminElevationManager,
    staff: StaffSessionPool,
}

impl ModeGate {
    pub fn new(owners: OwnerSessions, admin: AdminElevationManager, staff: StaffSessionPool) -> Self {
        Self {
            owners,
            admin,
            staff,
        }
    }

    /// Validate every token the client presented
    ///
    /// Invalid tokens are not errors; they are flagged stale so the decision
    /// can clear them.
    pub async fn resolve(&self, ctx: &ClientContext) -> AccessResult<ResolvedContext> {
        let mut resolved = ResolvedContext::default();

        if let Some(token) = &ctx.staff_token {
            resolved.staff = self.staff.validate(token).await?;
            resolved.stale_staff_token = resolved.staff.is_none();
        }
        if let Some(token) = &ctx.admin_token {
            resolved.admin = self.admin.validate(token).await?;
            resolved.stale_admin_token = resolved.admin.is_none();
        }
        if let Some(token) = &ctx.owner_token {
            resolved.owner = self.owners.verify(token);
            resolved.stale_owner_token = resolved.owner.is_none();
        }

        Ok(resolved)
    }

    /// Resolve and decide in one step
    pub async fn evaluate(
        &self,
        route: RouteClass,
        ctx: &ClientContext,
    ) -> AccessResult<(ResolvedContext, GateDecision)> {
        let resolved = self.resolve(ctx).await?;
        let decision = decide(route, &resolved);

        if let GateDecision::Deny { reason, .. } = &decision {
            log::debug!("Gate denied {route:?}: {reason:?}");
        }
        Ok((resolved, decision))
    }

    /// Leave staff mode for the owner login boundary
    ///
    /// Ends the live staff session if there is one, and clears the baseline
    /// owner session too: getting back to owner mode always requires a fresh
    /// login.
    pub async fn switch_to_admin(
        &self,
        resolved: &ResolvedContext,
        client: &ClientInfo,
    ) -> AccessResult<(Option<TerminatedSession>, GateDecision)> {
        let terminated = match &resolved.staff {
            Some(session) => self.staff.end_for_switch_to_admin(session, client).await?,
            None => None,
        };

        Ok((
            terminated,
            GateDecision::Redirect {
                to: OWNER_LOGIN_PATH,
                directives: ON_SWITCH_TO_ADMIN.to_vec(),
            },
        ))
    }
}
