//! Role-scoped notification visibility.
//!
//! Applied at read time; the cache always holds the unfiltered server list.

use assoc_core::{NotificationEntry, Role, Viewer};

/// Roles that see every notification unfiltered.
pub const FULL_VISIBILITY_ROLES: &[Role] = &[Role::Admin, Role::Treasurer, Role::President];

/// Whether `viewer` sees the whole list without filtering.
pub fn sees_everything(viewer: &Viewer) -> bool {
    viewer
        .role
        .as_ref()
        .is_some_and(|role| FULL_VISIBILITY_ROLES.contains(role))
}

/// Whether a single entry is visible to `viewer`.
///
/// Meeting notifications, entries addressed to the viewer's id or role, and
/// broadcasts are visible to everyone.
pub fn is_visible(entry: &NotificationEntry, viewer: &Viewer) -> bool {
    if sees_everything(viewer) || entry.notification_type.is_meeting() || entry.is_broadcast() {
        return true;
    }
    if entry.recipient.is_some() && entry.recipient == viewer.user_id {
        return true;
    }
    match (&entry.recipient_role, &viewer.role) {
        (Some(recipient_role), Some(role)) => role.matches(recipient_role),
        _ => false,
    }
}

/// Entries visible to `viewer`, in the original order.
pub fn filter_visible(entries: &[NotificationEntry], viewer: &Viewer) -> Vec<NotificationEntry> {
    if sees_everything(viewer) {
        return entries.to_vec();
    }
    entries
        .iter()
        .filter(|entry| is_visible(entry, viewer))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assoc_core::NotificationType;

    fn viewer(id: i64, role: &str) -> Viewer {
        Viewer::new(Some(id), Some(Role::parse(role)))
    }

    fn sample() -> Vec<NotificationEntry> {
        vec![
            NotificationEntry::new(1, NotificationType::MeetingScheduled, "AGM")
                .with_recipient_role("president"),
            NotificationEntry::new(2, NotificationType::BudgetAlert, "Budget")
                .with_recipient_role("treasurer"),
            NotificationEntry::new(3, NotificationType::TaskAssigned, "Task").with_recipient(7),
            NotificationEntry::new(4, NotificationType::System, "Maintenance"),
            NotificationEntry::new(5, NotificationType::TaskAssigned, "Other task")
                .with_recipient(8),
        ]
    }

    fn ids(entries: &[NotificationEntry]) -> Vec<i64> {
        entries.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_full_visibility_roles_see_everything() {
        for role in ["admin", "Treasurer", "PRESIDENT"] {
            assert_eq!(ids(&filter_visible(&sample(), &viewer(1, role))), vec![1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_member_sees_meetings_direct_and_broadcast() {
        assert_eq!(ids(&filter_visible(&sample(), &viewer(7, "member"))), vec![1, 3, 4]);
    }

    #[test]
    fn test_recipient_role_matches_case_insensitively() {
        let entry = NotificationEntry::new(9, NotificationType::ReportReady, "Report")
            .with_recipient_role("Secretary");
        assert!(is_visible(&entry, &viewer(1, "secretary")));
        assert!(!is_visible(&entry, &viewer(1, "member")));
    }

    #[test]
    fn test_treasurer_role_entry_hidden_from_member() {
        let entry = NotificationEntry::new(2, NotificationType::BudgetAlert, "Budget")
            .with_recipient_role("treasurer");
        assert!(is_visible(&entry, &viewer(1, "treasurer")));
        assert!(!is_visible(&entry, &viewer(1, "member")));
    }

    #[test]
    fn test_anonymous_viewer_sees_only_public_entries() {
        let anonymous = Viewer::default();
        assert_eq!(ids(&filter_visible(&sample(), &anonymous)), vec![1, 4]);
    }
}
