//! Full capability grid of the standard association roles.

use assoc_core::{Action, PermissionResolver, Resource, UserProfile};

/// Expected non-view grants (create/edit/delete) per role, as
/// (resource, action) pairs.
fn expected_writes(role: &str) -> Vec<(Resource, Action)> {
    use Action::*;
    use Resource::*;

    let ced = |r: Resource| vec![(r, Create), (r, Edit), (r, Delete)];
    match role {
        "president" => Resource::ALL.iter().flat_map(|r| ced(*r)).collect(),
        "treasurer" => {
            let mut v = ced(Finance);
            v.extend(ced(Reports));
            v.push((Meetings, Create));
            v
        }
        "secretary" => [Tasks, Meetings, Reports]
            .into_iter()
            .flat_map(ced)
            .collect(),
        _ => vec![],
    }
}

#[test]
fn test_standard_role_grid() {
    for role in ["president", "treasurer", "secretary", "member", "volunteer"] {
        let resolver = PermissionResolver::from_profile(UserProfile::with_role(role));
        let writes = expected_writes(role);
        let known = role != "volunteer";

        for resource in Resource::ALL {
            let view = known && !(role == "member" && *resource == Resource::Reports);
            assert_eq!(
                resolver.can(Action::View, *resource),
                view,
                "{} view {}",
                role,
                resource
            );
            for action in [Action::Create, Action::Edit, Action::Delete] {
                assert_eq!(
                    resolver.can(action, *resource),
                    writes.contains(&(*resource, action)),
                    "{} {} {}",
                    role,
                    action,
                    resource
                );
            }
        }
    }
}

#[test]
fn test_validate_user_only_on_members() {
    let resolver = PermissionResolver::from_profile(UserProfile::with_role("president"));
    for resource in Resource::ALL {
        assert_eq!(
            resolver.can(Action::ValidateUser, *resource),
            *resource == Resource::Members
        );
    }
}

#[test]
fn test_superuser_ignores_role() {
    let profile = UserProfile {
        is_superuser: true,
        ..UserProfile::with_role("volunteer")
    };
    let resolver = PermissionResolver::from_profile(profile);
    assert!(resolver.can(Action::Delete, Resource::Chatbot));
    assert!(resolver.can(Action::ValidateUser, Resource::PendingUsers));
    assert!(resolver.can_validate_users());
}

#[test]
fn test_matrix_actions_for() {
    let resolver = PermissionResolver::from_profile(UserProfile::with_role("treasurer"));
    let matrix = resolver.matrix();
    assert_eq!(matrix.actions_for(Resource::Meetings), vec![Action::View, Action::Create]);
    assert_eq!(
        matrix.actions_for(Resource::Finance),
        vec![Action::View, Action::Create, Action::Edit, Action::Delete]
    );
    assert_eq!(matrix.iter().count(), Resource::ALL.len());
}
