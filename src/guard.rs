use crate::models::user::RoleTag;
use crate::roles::RoleRoutes;

/// Session facts the guard decides from. Produced by
/// [`crate::session::SessionManager::guard_context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardContext {
    pub loading: bool,
    pub authenticated: bool,
    pub active_role: Option<RoleTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Initial storage read has not finished; render a neutral indicator
    /// and do not redirect yet.
    Wait,
    /// Not authenticated; `route` is the login entry point with the
    /// requested location captured for a best-effort return.
    ToLogin { route: String },
    /// Authenticated but no resolvable dashboard for the active role.
    ToUnauthorized { route: String },
    /// Active role does not match the route's required role; go to the
    /// active role's own dashboard instead.
    ToDashboard { route: String },
    Render,
}

/// Gate for role-scoped pages. Pure: a decision function of the session
/// facts and the route's declared requirement, with no side effects.
pub struct RouteGuard {
    routes: RoleRoutes,
}

impl RouteGuard {
    pub fn new(routes: RoleRoutes) -> Self {
        Self { routes }
    }

    pub fn evaluate(
        &self,
        ctx: &GuardContext,
        required_role: RoleTag,
        requested_path: &str,
    ) -> RouteDecision {
        if ctx.loading {
            return RouteDecision::Wait;
        }

        if !ctx.authenticated {
            return RouteDecision::ToLogin {
                route: self.routes.login_path(Some(requested_path)),
            };
        }

        let dashboard = ctx
            .active_role
            .and_then(|role| self.routes.dashboard(role));
        let Some(dashboard) = dashboard else {
            return RouteDecision::ToUnauthorized {
                route: self.routes.unauthorized.clone(),
            };
        };

        if ctx.active_role != Some(required_role) {
            return RouteDecision::ToDashboard {
                route: dashboard.to_string(),
            };
        }

        RouteDecision::Render
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> RouteGuard {
        RouteGuard::new(RoleRoutes::default())
    }

    fn ctx(loading: bool, authenticated: bool, active_role: Option<RoleTag>) -> GuardContext {
        GuardContext {
            loading,
            authenticated,
            active_role,
        }
    }

    #[test]
    fn loading_waits_without_redirecting() {
        let decision = guard().evaluate(
            &ctx(true, false, None),
            RoleTag::Student,
            "/student/dashboard",
        );
        assert_eq!(decision, RouteDecision::Wait);
    }

    #[test]
    fn unauthenticated_goes_to_login_with_return_location() {
        let decision = guard().evaluate(
            &ctx(false, false, None),
            RoleTag::Teacher,
            "/teacher/points",
        );
        assert_eq!(
            decision,
            RouteDecision::ToLogin {
                route: "/login?redirect=%2Fteacher%2Fpoints".to_string(),
            }
        );
    }

    #[test]
    fn authenticated_without_active_role_is_unauthorized() {
        let decision = guard().evaluate(
            &ctx(false, true, None),
            RoleTag::Parent,
            "/parent/dashboard",
        );
        assert_eq!(
            decision,
            RouteDecision::ToUnauthorized {
                route: "/unauthorized".to_string(),
            }
        );
    }

    #[test]
    fn wrong_role_is_sent_to_own_dashboard() {
        // A parent requesting a teacher page lands on the parent dashboard,
        // never the teacher page.
        let decision = guard().evaluate(
            &ctx(false, true, Some(RoleTag::Parent)),
            RoleTag::Teacher,
            "/teacher/dashboard",
        );
        assert_eq!(
            decision,
            RouteDecision::ToDashboard {
                route: "/parent/dashboard".to_string(),
            }
        );
    }

    #[test]
    fn matching_role_renders() {
        let decision = guard().evaluate(
            &ctx(false, true, Some(RoleTag::Teacher)),
            RoleTag::Teacher,
            "/teacher/dashboard",
        );
        assert_eq!(decision, RouteDecision::Render);
    }

    #[test]
    fn loading_wins_over_everything_else() {
        let decision = guard().evaluate(
            &ctx(true, true, Some(RoleTag::Teacher)),
            RoleTag::Teacher,
            "/teacher/dashboard",
        );
        assert_eq!(decision, RouteDecision::Wait);
    }
}
