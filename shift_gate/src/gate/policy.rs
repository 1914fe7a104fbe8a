//! Mode-exclusivity decisions as a pure function.

use super::context::{Mode, ResolvedContext};

/// Path of the owner login boundary clients are sent to on mode exit
pub const OWNER_LOGIN_PATH: &str = "/api/v1/owner/login";

/// Access class of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// No session needed (login boundaries, health)
    Public,
    /// Reachable from staff mode so the client can leave it: switch-to-admin,
    /// staff sign-out, business-info lookup
    StaffExit,
    /// Requires a live staff session
    Staff,
    /// Requires the baseline owner session
    Owner,
    /// Requires a valid elevated admin session
    Admin,
}

/// Client-side token change the transport must apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    ClearStaffToken,
    ClearOwnerSession,
    ClearAdminToken,
}

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Owner or admin route requested while in staff mode
    StaffModeActive,
    /// Staff route requested without a live staff session
    StaffSessionRequired,
    /// Admin route requested without a valid elevation
    ElevationRequired,
}

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed {
        mode: Mode,
        directives: Vec<Directive>,
    },
    Deny {
        reason: DenyReason,
        directives: Vec<Directive>,
    },
    Redirect {
        to: &'static str,
        directives: Vec<Directive>,
    },
}

impl GateDecision {
    pub fn directives(&self) -> &[Directive] {
        match self {
            GateDecision::Proceed { directives, .. }
            | GateDecision::Deny { directives, .. }
            | GateDecision::Redirect { directives, .. } => directives,
        }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, GateDecision::Proceed { .. })
    }
}

/// Decide whether a request may proceed in the mode its context resolves to
///
/// Stale tokens never deny on their own: they are cleared and the request
/// falls through to baseline handling.
pub fn decide(route: RouteClass, ctx: &ResolvedContext) -> GateDecision {
    let mut directives = Vec::new();
    if ctx.stale_staff_token {
        directives.push(Directive::ClearStaffToken);
    }
    if ctx.stale_admin_token {
        directives.push(Directive::ClearAdminToken);
    }
    if ctx.stale_owner_token {
        directives.push(Directive::ClearOwnerSession);
    }

    let mode = ctx.mode();

    if mode == Mode::Staff {
        return match route {
            RouteClass::Public | RouteClass::StaffExit | RouteClass::Staff => {
                GateDecision::Proceed { mode, directives }
            }
            RouteClass::Owner | RouteClass::Admin => GateDecision::Deny {
                reason: DenyReason::StaffModeActive,
                directives,
            },
        };
    }

    match route {
        RouteClass::Public | RouteClass::StaffExit => GateDecision::Proceed { mode, directives },
        RouteClass::Staff => GateDecision::Deny {
            reason: DenyReason::StaffSessionRequired,
            directives,
        },
        RouteClass::Owner if ctx.owner.is_some() => GateDecision::Proceed { mode, directives },
        RouteClass::Owner => GateDecision::Redirect {
            to: OWNER_LOGIN_PATH,
            directives,
        },
        RouteClass::Admin if ctx.admin.is_some() => GateDecision::Proceed { mode, directives },
        RouteClass::Admin => GateDecision::Deny {
            reason: DenyReason::ElevationRequired,
            directives,
        },
    }
}

/// Tokens to clear after a staff login succeeds
pub const AFTER_STAFF_LOGIN: [Directive; 1] = [Directive::ClearAdminToken];

/// Tokens to clear after an admin elevation succeeds
pub const AFTER_ADMIN_LOGIN: [Directive; 1] = [Directive::ClearStaffToken];

/// Tokens to clear when leaving staff mode for admin mode
pub const ON_SWITCH_TO_ADMIN: [Directive; 3] = [
    Directive::ClearStaffToken,
    Directive::ClearOwnerSession,
    Directive::ClearAdminToken,
];
