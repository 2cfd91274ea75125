//! Terminal rendering and the stdout-backed toast and navigation sinks.

use assoc_core::{CapabilityMatrix, NotificationEntry, Resource, UserProfile};
use assoc_notify::{Navigator, Toast, ToastSink};

/// One-line summary of a notification.
pub fn format_entry(entry: &NotificationEntry) -> String {
    let mark = if entry.read { " " } else { "*" };
    format!(
        "{} #{:<6} {:<22} {:<6} {}",
        mark,
        entry.id,
        entry.notification_type.tag(),
        entry.priority.to_string(),
        entry.title
    )
}

/// Profile header for `whoami`.
pub fn format_profile(profile: &UserProfile, can_validate_users: bool) -> String {
    let mut lines = vec![
        format!("user:        {}", profile.username.as_deref().unwrap_or("(unknown)")),
        format!("role:        {}", profile.role_name().unwrap_or("(none)")),
        format!("superuser:   {}", profile.is_superuser),
        format!("validates:   {}", can_validate_users),
    ];
    if let Some(association) = &profile.association {
        lines.push(format!(
            "association: {}",
            association
                .name
                .clone()
                .unwrap_or_else(|| format!("#{}", association.id))
        ));
    }
    lines.join("\n")
}

/// Resource by resource listing of allowed actions.
pub fn format_matrix(matrix: &CapabilityMatrix) -> String {
    Resource::ALL
        .iter()
        .map(|resource| {
            let actions: Vec<String> = matrix
                .actions_for(*resource)
                .iter()
                .map(|a| a.to_string())
                .collect();
            let actions = if actions.is_empty() {
                "-".to_string()
            } else {
                actions.join(", ")
            };
            format!("{:<13} {}", resource.as_str(), actions)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Toasts printed to stdout.
#[derive(Debug, Default)]
pub struct StdoutToasts;

impl ToastSink for StdoutToasts {
    fn show(&self, toast: Toast) {
        println!("!! [{}] {}: {}", toast.icon, toast.title, toast.message);
    }
}

/// Navigation printed to stdout.
#[derive(Debug, Default)]
pub struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, route: &str) {
        println!("-> {}", route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assoc_core::{NotificationType, PermissionTable, Priority, Role};

    #[test]
    fn test_format_entry_marks_unread() {
        let entry = NotificationEntry::new(12, NotificationType::BudgetAlert, "Over budget")
            .with_priority(Priority::High);
        let line = format_entry(&entry);
        assert!(line.starts_with("* #12"));
        assert!(line.contains("budget_alert"));
        assert!(line.contains("high"));
        assert!(line.ends_with("Over budget"));

        assert!(format_entry(&entry.with_read(true)).starts_with("  #12"));
    }

    #[test]
    fn test_format_matrix_lists_every_resource() {
        let matrix = PermissionTable::standard().matrix_for(Some(&Role::Member));
        let rendered = format_matrix(&matrix);
        assert_eq!(rendered.lines().count(), Resource::ALL.len());
        assert!(rendered.contains("pendingUsers"));
    }

    #[test]
    fn test_format_profile() {
        let profile = UserProfile::with_role("Treasurer");
        let rendered = format_profile(&profile, true);
        assert!(rendered.contains("role:        Treasurer"));
        assert!(rendered.contains("validates:   true"));
    }
}
