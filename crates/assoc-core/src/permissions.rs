//! Role-based permission model.
//!
//! A [`CapabilityMatrix`] maps each [`Resource`] to the set of [`Action`]s the
//! current user may perform. It is derived from the user profile through a
//! declarative role table ([`STANDARD_GRANTS`]); superusers bypass the table
//! entirely.
//!
//! [`PermissionResolver`] owns the matrix for a session. It fails closed:
//! while loading, without a token, or after a failed profile fetch every
//! check answers `false`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::Error;
use crate::models::UserProfile;
use crate::traits::ConsoleApi;

// =============================================================================
// RESOURCES AND ACTIONS
// =============================================================================

/// Domain area subject to permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Projects,
    Members,
    Finance,
    Tasks,
    Meetings,
    Reports,
    PendingUsers,
    Chatbot,
}

impl Resource {
    pub const ALL: &'static [Resource] = &[
        Resource::Projects,
        Resource::Members,
        Resource::Finance,
        Resource::Tasks,
        Resource::Meetings,
        Resource::Reports,
        Resource::PendingUsers,
        Resource::Chatbot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Projects => "projects",
            Resource::Members => "members",
            Resource::Finance => "finance",
            Resource::Tasks => "tasks",
            Resource::Meetings => "meetings",
            Resource::Reports => "reports",
            Resource::PendingUsers => "pendingUsers",
            Resource::Chatbot => "chatbot",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("unknown resource: {}", s)))
    }
}

/// Operation checked against a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    ValidateUser,
}

impl Action {
    /// Actions a role table can grant. `ValidateUser` is governed separately.
    pub const BASE: &'static [Action] = &[Action::View, Action::Create, Action::Edit, Action::Delete];

    pub const ALL: &'static [Action] = &[
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::ValidateUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::ValidateUser => "validate_user",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidInput(format!("unknown action: {}", s)))
    }
}

// =============================================================================
// ROLES
// =============================================================================

/// Association role, parsed case-insensitively from the profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    President,
    Treasurer,
    Secretary,
    Member,
    Admin,
    Other(String),
}

impl Role {
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "president" => Role::President,
            "treasurer" => Role::Treasurer,
            "secretary" => Role::Secretary,
            "member" => Role::Member,
            "admin" => Role::Admin,
            _ => Role::Other(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Role::President => "president",
            Role::Treasurer => "treasurer",
            Role::Secretary => "secretary",
            Role::Member => "member",
            Role::Admin => "admin",
            Role::Other(name) => name,
        }
    }

    /// Case-insensitive comparison against a raw role name.
    pub fn matches(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// CAPABILITY MATRIX
// =============================================================================

/// Resource → allowed actions for one session.
///
/// Never patched in place: a new matrix is computed whenever the profile
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CapabilityMatrix {
    grants: BTreeMap<Resource, BTreeSet<Action>>,
}

impl CapabilityMatrix {
    /// No action on any resource.
    pub fn empty() -> Self {
        let grants = Resource::ALL
            .iter()
            .map(|r| (*r, BTreeSet::new()))
            .collect();
        Self { grants }
    }

    /// Every base action on every resource (superuser).
    pub fn full() -> Self {
        let grants = Resource::ALL
            .iter()
            .map(|r| (*r, Action::BASE.iter().copied().collect()))
            .collect();
        Self { grants }
    }

    pub fn allows(&self, action: Action, resource: Resource) -> bool {
        self.grants
            .get(&resource)
            .is_some_and(|actions| actions.contains(&action))
    }

    pub fn actions_for(&self, resource: Resource) -> Vec<Action> {
        self.grants
            .get(&resource)
            .map(|actions| actions.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, &BTreeSet<Action>)> {
        self.grants.iter().map(|(r, a)| (*r, a))
    }

    /// True when no action is granted anywhere.
    pub fn is_empty(&self) -> bool {
        self.grants.values().all(BTreeSet::is_empty)
    }

    fn grant(&mut self, resource: Resource, actions: &[Action]) {
        self.grants
            .entry(resource)
            .or_default()
            .extend(actions.iter().copied());
    }
}

// =============================================================================
// ROLE TABLE
// =============================================================================

/// Which resources a grant row applies to.
#[derive(Debug, Clone, Copy)]
pub enum Scope {
    All,
    Only(&'static [Resource]),
    AllExcept(&'static [Resource]),
}

impl Scope {
    fn resources(self) -> impl Iterator<Item = Resource> {
        Resource::ALL.iter().copied().filter(move |r| match self {
            Scope::All => true,
            Scope::Only(list) => list.contains(r),
            Scope::AllExcept(list) => !list.contains(r),
        })
    }
}

/// One row of the role table.
#[derive(Debug, Clone)]
pub struct Grant {
    pub role: Role,
    pub scope: Scope,
    pub actions: &'static [Action],
}

const CED: &[Action] = &[Action::Create, Action::Edit, Action::Delete];

/// Grants of the standard association roles. Roles absent from this table get
/// nothing.
pub const STANDARD_GRANTS: &[Grant] = &[
    Grant {
        role: Role::President,
        scope: Scope::All,
        actions: Action::BASE,
    },
    Grant {
        role: Role::Treasurer,
        scope: Scope::All,
        actions: &[Action::View],
    },
    Grant {
        role: Role::Treasurer,
        scope: Scope::Only(&[Resource::Finance, Resource::Reports]),
        actions: CED,
    },
    Grant {
        role: Role::Treasurer,
        scope: Scope::Only(&[Resource::Meetings]),
        actions: &[Action::Create],
    },
    Grant {
        role: Role::Secretary,
        scope: Scope::All,
        actions: &[Action::View],
    },
    Grant {
        role: Role::Secretary,
        scope: Scope::Only(&[Resource::Tasks, Resource::Meetings, Resource::Reports]),
        actions: CED,
    },
    Grant {
        role: Role::Member,
        scope: Scope::AllExcept(&[Resource::Reports]),
        actions: &[Action::View],
    },
];

/// Roles allowed to validate pending users.
pub const STANDARD_USER_VALIDATORS: &[Role] = &[Role::President, Role::Treasurer, Role::Secretary];

/// Role → capability matrix lookup, built once from grant rows.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    by_role: HashMap<Role, CapabilityMatrix>,
    validators: HashSet<Role>,
}

static STANDARD_TABLE: Lazy<Arc<PermissionTable>> = Lazy::new(|| {
    Arc::new(PermissionTable::from_grants(
        STANDARD_GRANTS,
        STANDARD_USER_VALIDATORS,
    ))
});

impl PermissionTable {
    pub fn from_grants(grants: &[Grant], validators: &[Role]) -> Self {
        let mut by_role: HashMap<Role, CapabilityMatrix> = HashMap::new();
        for grant in grants {
            let matrix = by_role
                .entry(grant.role.clone())
                .or_insert_with(CapabilityMatrix::empty);
            for resource in grant.scope.resources() {
                matrix.grant(resource, grant.actions);
            }
        }
        Self {
            by_role,
            validators: validators.iter().cloned().collect(),
        }
    }

    /// Shared instance of the standard association table.
    pub fn standard() -> Arc<Self> {
        STANDARD_TABLE.clone()
    }

    /// Matrix for a role; unknown or missing roles get an empty matrix.
    pub fn matrix_for(&self, role: Option<&Role>) -> CapabilityMatrix {
        role.and_then(|r| self.by_role.get(r))
            .cloned()
            .unwrap_or_else(CapabilityMatrix::empty)
    }

    pub fn can_validate_users(&self, role: Option<&Role>) -> bool {
        role.is_some_and(|r| self.validators.contains(r))
    }

    /// Resolve the session permissions of a profile.
    pub fn resolve(&self, profile: UserProfile) -> SessionPermissions {
        if profile.is_superuser {
            return SessionPermissions {
                profile,
                matrix: CapabilityMatrix::full(),
                can_validate_users: true,
            };
        }
        let role = profile.role();
        SessionPermissions {
            matrix: self.matrix_for(role.as_ref()),
            can_validate_users: self.can_validate_users(role.as_ref()),
            profile,
        }
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Permissions resolved for the current session.
#[derive(Debug, Clone)]
pub struct SessionPermissions {
    pub profile: UserProfile,
    pub matrix: CapabilityMatrix,
    pub can_validate_users: bool,
}

impl SessionPermissions {
    pub fn can(&self, action: Action, resource: Resource) -> bool {
        if self.profile.is_superuser {
            return true;
        }
        if action == Action::ValidateUser && resource == Resource::Members {
            return self.can_validate_users;
        }
        self.matrix.allows(action, resource)
    }
}

#[derive(Debug, Clone, Default)]
enum ResolverState {
    #[default]
    Loading,
    Denied,
    Ready(Arc<SessionPermissions>),
}

/// Answers `can(action, resource)` for the current session.
pub struct PermissionResolver {
    table: Arc<PermissionTable>,
    state: RwLock<ResolverState>,
}

impl Default for PermissionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionResolver {
    /// New resolver in the loading state, using the standard table.
    pub fn new() -> Self {
        Self::with_table(PermissionTable::standard())
    }

    pub fn with_table(table: Arc<PermissionTable>) -> Self {
        Self {
            table,
            state: RwLock::new(ResolverState::Loading),
        }
    }

    /// Resolver already settled on a known profile.
    pub fn from_profile(profile: UserProfile) -> Self {
        let resolver = Self::new();
        resolver.apply_profile(profile);
        resolver
    }

    /// Fetch the profile and replace the matrix.
    ///
    /// Never fails: a missing token or a fetch error settles the resolver in
    /// the denied state.
    #[instrument(skip(self, api), fields(subsystem = "permissions", op = "fetch_profile"))]
    pub async fn refresh(&self, api: &dyn ConsoleApi) {
        *self.write() = ResolverState::Loading;

        match api.fetch_profile().await {
            Ok(profile) => self.apply_profile(profile),
            Err(Error::Unauthenticated(reason)) => {
                info!(%reason, "No auth token, all permissions denied");
                *self.write() = ResolverState::Denied;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch user profile, all permissions denied");
                *self.write() = ResolverState::Denied;
            }
        }
    }

    /// Compute a fresh matrix from `profile` and swap it in.
    pub fn apply_profile(&self, profile: UserProfile) {
        let resolved = self.table.resolve(profile);
        debug!(
            role = resolved.profile.role_name().unwrap_or("(none)"),
            is_superuser = resolved.profile.is_superuser,
            can_validate_users = resolved.can_validate_users,
            "Capability matrix computed"
        );
        *self.write() = ResolverState::Ready(Arc::new(resolved));
    }

    /// Drop the session (logout).
    pub fn clear(&self) {
        *self.write() = ResolverState::Denied;
    }

    pub fn can(&self, action: Action, resource: Resource) -> bool {
        match &*self.read() {
            ResolverState::Ready(perms) => perms.can(action, resource),
            ResolverState::Loading | ResolverState::Denied => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(&*self.read(), ResolverState::Loading)
    }

    pub fn is_superuser(&self) -> bool {
        self.snapshot().is_some_and(|p| p.profile.is_superuser)
    }

    pub fn can_validate_users(&self) -> bool {
        self.snapshot().is_some_and(|p| p.can_validate_users)
    }

    pub fn user_role(&self) -> Option<Role> {
        self.snapshot().and_then(|p| p.profile.role())
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.snapshot().map(|p| p.profile.clone())
    }

    /// Current matrix; empty unless a profile has been resolved.
    pub fn matrix(&self) -> CapabilityMatrix {
        self.snapshot()
            .map(|p| p.matrix.clone())
            .unwrap_or_else(CapabilityMatrix::empty)
    }

    /// Resolved permissions, if the resolver has settled on a profile.
    pub fn snapshot(&self) -> Option<Arc<SessionPermissions>> {
        match &*self.read() {
            ResolverState::Ready(perms) => Some(perms.clone()),
            _ => None,
        }
    }

    // The lock is never held across an await, so a poisoned guard still
    // holds a consistent state.
    fn read(&self) -> RwLockReadGuard<'_, ResolverState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ResolverState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(role: &str) -> PermissionResolver {
        PermissionResolver::from_profile(UserProfile::with_role(role))
    }

    #[test]
    fn test_delete_finance_only_president_and_treasurer() {
        assert!(resolver("president").can(Action::Delete, Resource::Finance));
        assert!(resolver("treasurer").can(Action::Delete, Resource::Finance));
        assert!(!resolver("secretary").can(Action::Delete, Resource::Finance));
        assert!(!resolver("member").can(Action::Delete, Resource::Finance));
    }

    #[test]
    fn test_superuser_can_everything() {
        let r = PermissionResolver::from_profile(UserProfile {
            is_superuser: true,
            ..UserProfile::with_role("member")
        });
        for action in Action::ALL {
            for resource in Resource::ALL {
                assert!(r.can(*action, *resource), "{} {}", action, resource);
            }
        }
        assert!(r.is_superuser());
        assert!(r.can_validate_users());
    }

    #[test]
    fn test_member_cannot_view_reports() {
        assert!(!resolver("member").can(Action::View, Resource::Reports));
        assert!(resolver("member").can(Action::View, Resource::Projects));
        assert!(resolver("secretary").can(Action::View, Resource::Reports));
    }

    #[test]
    fn test_view_granted_to_all_known_roles() {
        for role in ["president", "treasurer", "secretary", "member"] {
            let r = resolver(role);
            for resource in Resource::ALL {
                let expected = !(role == "member" && *resource == Resource::Reports);
                assert_eq!(r.can(Action::View, *resource), expected, "{} {}", role, resource);
            }
        }
    }

    #[test]
    fn test_treasurer_meetings_create_only() {
        let r = resolver("treasurer");
        assert!(r.can(Action::Create, Resource::Meetings));
        assert!(!r.can(Action::Edit, Resource::Meetings));
        assert!(!r.can(Action::Delete, Resource::Meetings));
        assert!(r.can(Action::Edit, Resource::Reports));
        assert!(!r.can(Action::Create, Resource::Projects));
    }

    #[test]
    fn test_secretary_grants() {
        let r = resolver("secretary");
        for resource in [Resource::Tasks, Resource::Meetings, Resource::Reports] {
            for action in [Action::Create, Action::Edit, Action::Delete] {
                assert!(r.can(action, resource), "{} {}", action, resource);
            }
        }
        assert!(!r.can(Action::Create, Resource::Finance));
        assert!(!r.can(Action::Delete, Resource::Members));
    }

    #[test]
    fn test_president_full_base_actions() {
        let r = resolver("PRESIDENT");
        for action in Action::BASE {
            for resource in Resource::ALL {
                assert!(r.can(*action, *resource));
            }
        }
    }

    #[test]
    fn test_can_validate_users_by_role() {
        assert!(resolver("president").can_validate_users());
        assert!(resolver("treasurer").can_validate_users());
        assert!(resolver("Secretary").can_validate_users());
        assert!(!resolver("member").can_validate_users());
        assert!(!resolver("admin").can_validate_users());

        assert!(resolver("treasurer").can(Action::ValidateUser, Resource::Members));
        assert!(!resolver("treasurer").can(Action::ValidateUser, Resource::Projects));
        assert!(!resolver("member").can(Action::ValidateUser, Resource::Members));
    }

    #[test]
    fn test_unknown_role_denied_everything() {
        for role in ["volunteer", "admin", ""] {
            let r = resolver(role);
            assert!(r.matrix().is_empty(), "role {:?}", role);
            for resource in Resource::ALL {
                assert!(!r.can(Action::View, *resource));
            }
        }
        let r = PermissionResolver::from_profile(UserProfile::default());
        assert!(r.matrix().is_empty());
        assert!(!r.is_loading());
    }

    #[test]
    fn test_new_resolver_is_loading_and_denies() {
        let r = PermissionResolver::new();
        assert!(r.is_loading());
        assert!(!r.can(Action::View, Resource::Projects));
        assert!(r.user_role().is_none());
    }

    #[test]
    fn test_apply_profile_replaces_matrix() {
        let r = resolver("president");
        assert!(r.can(Action::Delete, Resource::Projects));

        r.apply_profile(UserProfile::with_role("member"));
        assert!(!r.can(Action::Delete, Resource::Projects));
        assert_eq!(r.user_role(), Some(Role::Member));
    }

    #[test]
    fn test_clear_denies() {
        let r = resolver("president");
        r.clear();
        assert!(!r.can(Action::View, Resource::Projects));
        assert!(!r.is_loading());
        assert!(r.profile().is_none());
    }

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!(Role::parse(" Treasurer "), Role::Treasurer);
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
        assert_eq!(Role::parse("Volunteer"), Role::Other("volunteer".to_string()));
        assert!(Role::Treasurer.matches("TREASURER"));
    }

    #[test]
    fn test_resource_and_action_parse() {
        assert_eq!("pendingUsers".parse::<Resource>().unwrap(), Resource::PendingUsers);
        assert_eq!("FINANCE".parse::<Resource>().unwrap(), Resource::Finance);
        assert!("budgets".parse::<Resource>().is_err());
        assert_eq!("validate_user".parse::<Action>().unwrap(), Action::ValidateUser);
        assert!("approve".parse::<Action>().is_err());
    }

    #[test]
    fn test_resource_serde_names() {
        assert_eq!(
            serde_json::to_string(&Resource::PendingUsers).unwrap(),
            r#""pendingUsers""#
        );
        assert_eq!(
            serde_json::to_string(&Action::ValidateUser).unwrap(),
            r#""validate_user""#
        );
    }

    #[tokio::test]
    async fn test_refresh_from_backend() {
        let api = crate::mock::MockConsoleApi::new()
            .with_profile(UserProfile::with_role("Secretary").with_id(4));
        let r = PermissionResolver::new();
        r.refresh(&api).await;

        assert!(!r.is_loading());
        assert_eq!(r.user_role(), Some(Role::Secretary));
        assert!(r.can(Action::Edit, Resource::Meetings));
        assert!(!r.can(Action::Edit, Resource::Finance));
    }

    #[tokio::test]
    async fn test_refresh_without_token_denies() {
        let api = crate::mock::MockConsoleApi::new().without_token();
        let r = PermissionResolver::new();
        r.refresh(&api).await;

        assert!(!r.is_loading());
        assert!(r.profile().is_none());
        assert!(!r.can(Action::View, Resource::Projects));
    }

    #[tokio::test]
    async fn test_refresh_failure_fails_closed() {
        let api = crate::mock::MockConsoleApi::new()
            .with_profile(UserProfile::with_role("president"));
        let r = PermissionResolver::new();
        r.refresh(&api).await;
        assert!(r.can(Action::Delete, Resource::Finance));

        api.set_fail_profile(true);
        r.refresh(&api).await;
        assert!(!r.is_loading());
        assert!(!r.can(Action::Delete, Resource::Finance));
        assert!(r.matrix().is_empty());
    }

    #[test]
    fn test_custom_table() {
        let table = Arc::new(PermissionTable::from_grants(
            &[Grant {
                role: Role::Other("volunteer".to_string()),
                scope: Scope::Only(&[Resource::Tasks]),
                actions: &[Action::View, Action::Edit],
            }],
            &[],
        ));
        let r = PermissionResolver::with_table(table);
        r.apply_profile(UserProfile::with_role("Volunteer"));
        assert!(r.can(Action::Edit, Resource::Tasks));
        assert!(!r.can(Action::View, Resource::Finance));
        assert!(!r.can_validate_users());
    }
}
