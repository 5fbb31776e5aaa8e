use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::models::user::{ProfileSet, RoleTag, User};

/// Default landing page per role. Plain data, not behavior; callers may
/// supply their own table.
static DEFAULT_DASHBOARDS: Lazy<HashMap<RoleTag, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (RoleTag::Student, "/student/dashboard"),
        (RoleTag::Parent, "/parent/dashboard"),
        (RoleTag::Teacher, "/teacher/dashboard"),
        (RoleTag::SchoolAdmin, "/school-admin/dashboard"),
        (RoleTag::SocialWorker, "/social-worker/dashboard"),
        (RoleTag::PlatformAdmin, "/admin/dashboard"),
    ])
});

/// One-time profile-creation flow per role that needs one.
static DEFAULT_SETUP_ROUTES: Lazy<HashMap<RoleTag, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (RoleTag::Student, "/student/onboarding"),
        (RoleTag::Parent, "/parent/onboarding"),
        (RoleTag::Teacher, "/teacher/onboarding"),
        (RoleTag::SocialWorker, "/social-worker/onboarding"),
    ])
});

/// Role-to-route configuration shared by the resolver and the route guard.
#[derive(Debug, Clone)]
pub struct RoleRoutes {
    dashboards: HashMap<RoleTag, String>,
    setups: HashMap<RoleTag, String>,
    pub login: String,
    pub unauthorized: String,
}

impl Default for RoleRoutes {
    fn default() -> Self {
        Self {
            dashboards: DEFAULT_DASHBOARDS
                .iter()
                .map(|(role, route)| (*role, route.to_string()))
                .collect(),
            setups: DEFAULT_SETUP_ROUTES
                .iter()
                .map(|(role, route)| (*role, route.to_string()))
                .collect(),
            login: "/login".to_string(),
            unauthorized: "/unauthorized".to_string(),
        }
    }
}

impl RoleRoutes {
    pub fn dashboard(&self, role: RoleTag) -> Option<&str> {
        self.dashboards.get(&role).map(String::as_str)
    }

    pub fn setup(&self, role: RoleTag) -> Option<&str> {
        self.setups.get(&role).map(String::as_str)
    }

    /// Login entry point, optionally carrying the originally requested
    /// location so it can be returned to after login.
    pub fn login_path(&self, return_to: Option<&str>) -> String {
        match return_to {
            Some(path) => format!("{}?redirect={}", self.login, urlencoding::encode(path)),
            None => self.login.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// The role is usable now; `route` is its dashboard.
    Dashboard,
    /// The role still needs its one-time profile step; `route` is the
    /// profile-creation flow.
    Setup,
}

/// Derived per resolution, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOption {
    pub label: String,
    pub role: RoleTag,
    pub route: String,
    pub kind: OptionKind,
}

#[derive(Debug, Clone)]
pub struct RoleResolution {
    pub options: Vec<SelectionOption>,
}

impl RoleResolution {
    /// The sole option, when there is exactly one; callers auto-select it
    /// without prompting.
    pub fn single(&self) -> Option<&SelectionOption> {
        match self.options.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn contains(&self, role: RoleTag) -> bool {
        self.options.iter().any(|option| option.role == role)
    }

    pub fn option_for(&self, role: RoleTag) -> Option<&SelectionOption> {
        self.options.iter().find(|option| option.role == role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoleResolutionError {
    #[error("no valid roles or profiles found")]
    NoUsableRole,
    #[error("the {0} role is not available for this account")]
    NotAvailable(RoleTag),
}

/// Pure mapping from `(user, profiles)` to the role options the user may
/// act as. Same input always yields the same output, ordered by
/// `user.roles`.
pub struct RoleResolver {
    routes: RoleRoutes,
}

impl RoleResolver {
    pub fn new(routes: RoleRoutes) -> Self {
        Self { routes }
    }

    pub fn resolve(
        &self,
        user: &User,
        profiles: &ProfileSet,
    ) -> Result<RoleResolution, RoleResolutionError> {
        let mut seen = HashSet::new();
        let mut options = Vec::new();

        for &role in &user.roles {
            if !seen.insert(role) {
                continue;
            }

            if !role.requires_profile() || profiles.contains(role) {
                if let Some(route) = self.routes.dashboard(role) {
                    options.push(SelectionOption {
                        label: role.to_string(),
                        role,
                        route: route.to_string(),
                        kind: OptionKind::Dashboard,
                    });
                } else {
                    tracing::warn!(role = role.as_str(), "no dashboard route configured for role");
                }
            } else if let Some(route) = self.routes.setup(role) {
                options.push(SelectionOption {
                    label: role.to_string(),
                    role,
                    route: route.to_string(),
                    kind: OptionKind::Setup,
                });
            } else {
                tracing::warn!(role = role.as_str(), "role has no profile and no setup route");
            }
        }

        if options.is_empty() {
            return Err(RoleResolutionError::NoUsableRole);
        }
        Ok(RoleResolution { options })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::RoleProfile;
    use uuid::Uuid;

    fn user_with_roles(roles: Vec<RoleTag>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "dana@example.com".into(),
            phone_number: None,
            first_name: "Dana".into(),
            last_name: "Okafor".into(),
            avatar_url: None,
            roles,
        }
    }

    fn profiles_for(roles: &[RoleTag]) -> ProfileSet {
        ProfileSet::from(
            roles
                .iter()
                .map(|&role| RoleProfile {
                    id: Uuid::new_v4(),
                    role,
                })
                .collect::<Vec<_>>(),
        )
    }

    fn resolver() -> RoleResolver {
        RoleResolver::new(RoleRoutes::default())
    }

    #[test]
    fn single_role_with_profile_yields_one_dashboard_option() {
        let user = user_with_roles(vec![RoleTag::Student]);
        let profiles = profiles_for(&[RoleTag::Student]);

        let resolution = resolver().resolve(&user, &profiles).unwrap();

        let only = resolution.single().expect("exactly one option");
        assert_eq!(only.label, "Student");
        assert_eq!(only.role, RoleTag::Student);
        assert_eq!(only.route, "/student/dashboard");
        assert_eq!(only.kind, OptionKind::Dashboard);
    }

    #[test]
    fn options_follow_user_role_order() {
        let user = user_with_roles(vec![RoleTag::Parent, RoleTag::Teacher]);
        let profiles = profiles_for(&[RoleTag::Teacher, RoleTag::Parent]);

        let resolution = resolver().resolve(&user, &profiles).unwrap();

        assert!(resolution.single().is_none());
        let roles: Vec<RoleTag> = resolution.options.iter().map(|o| o.role).collect();
        assert_eq!(roles, vec![RoleTag::Parent, RoleTag::Teacher]);
        assert_eq!(resolution.options[1].route, "/teacher/dashboard");
    }

    #[test]
    fn duplicate_role_tags_collapse_to_first_occurrence() {
        let user = user_with_roles(vec![RoleTag::Teacher, RoleTag::Teacher, RoleTag::Parent]);
        let profiles = profiles_for(&[RoleTag::Teacher, RoleTag::Parent]);

        let resolution = resolver().resolve(&user, &profiles).unwrap();

        assert_eq!(resolution.options.len(), 2);
        assert_eq!(resolution.options[0].role, RoleTag::Teacher);
    }

    #[test]
    fn missing_profile_routes_to_setup_flow() {
        let user = user_with_roles(vec![RoleTag::Student]);

        let resolution = resolver()
            .resolve(&user, &ProfileSet::default())
            .unwrap();

        let only = resolution.single().expect("setup option still offered");
        assert_eq!(only.kind, OptionKind::Setup);
        assert_eq!(only.route, "/student/onboarding");
    }

    #[test]
    fn admin_roles_resolve_without_profiles() {
        let user = user_with_roles(vec![RoleTag::PlatformAdmin]);

        let resolution = resolver()
            .resolve(&user, &ProfileSet::default())
            .unwrap();

        let only = resolution.single().unwrap();
        assert_eq!(only.kind, OptionKind::Dashboard);
        assert_eq!(only.route, "/admin/dashboard");
    }

    #[test]
    fn no_roles_is_an_error() {
        let user = user_with_roles(vec![]);

        let err = resolver()
            .resolve(&user, &ProfileSet::default())
            .unwrap_err();

        assert_eq!(err, RoleResolutionError::NoUsableRole);
    }

    #[test]
    fn same_input_resolves_identically() {
        let user = user_with_roles(vec![RoleTag::Parent, RoleTag::SocialWorker]);
        let profiles = profiles_for(&[RoleTag::Parent]);
        let resolver = resolver();

        let first = resolver.resolve(&user, &profiles).unwrap();
        let second = resolver.resolve(&user, &profiles).unwrap();

        assert_eq!(first.options, second.options);
    }

    #[test]
    fn login_path_encodes_return_location() {
        let routes = RoleRoutes::default();
        assert_eq!(
            routes.login_path(Some("/teacher/dashboard")),
            "/login?redirect=%2Fteacher%2Fdashboard"
        );
        assert_eq!(routes.login_path(None), "/login");
    }
}
