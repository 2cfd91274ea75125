//! Domain models exchanged with the association backend.
//!
//! All types here are read-only mirrors of server state. The only field ever
//! mutated locally is [`NotificationEntry::read`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::catalog::NotificationType;
use crate::permissions::Role;

// =============================================================================
// USER PROFILE
// =============================================================================

/// Role reference as embedded in the profile payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    #[serde(default)]
    pub id: Option<i64>,
    /// Role name, compared case-insensitively.
    #[serde(default)]
    pub name: Option<String>,
}

/// Association the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Profile of the logged-in user, fetched once per session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<RoleRef>,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub association: Option<AssociationRef>,
}

impl UserProfile {
    /// Profile with the given role name and no superuser flag.
    pub fn with_role(name: &str) -> Self {
        Self {
            role: Some(RoleRef {
                id: None,
                name: Some(name.to_string()),
            }),
            ..Default::default()
        }
    }

    /// Profile flagged as superuser, regardless of role.
    pub fn superuser() -> Self {
        Self {
            is_superuser: true,
            ..Default::default()
        }
    }

    /// Set the user id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Raw role name, if any.
    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().and_then(|r| r.name.as_deref())
    }

    /// Parsed role. `None` when the profile carries no role name.
    pub fn role(&self) -> Option<Role> {
        self.role_name().map(Role::parse)
    }

    /// Viewer identity used for role-scoped notification filtering.
    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.id,
            role: self.role(),
        }
    }
}

/// Identity of whoever is looking at a notification list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Viewer {
    pub user_id: Option<i64>,
    pub role: Option<Role>,
}

impl Viewer {
    pub fn new(user_id: Option<i64>, role: Option<Role>) -> Self {
        Self { user_id, role }
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Notification priority. Only `High` triggers toast and desktop alerts.
///
/// Parsing is lenient: case is ignored, and null or unrecognized values
/// read as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Priority::parse_lenient).unwrap_or_default())
    }
}

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// One server-originated notification.
///
/// `id` is the only key used for change detection; it is stable across
/// fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub id: i64,
    pub notification_type: NotificationType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "is_read", deserialize_with = "null_as_default")]
    pub read: bool,
    #[serde(default)]
    pub recipient: Option<i64>,
    #[serde(default)]
    pub recipient_role: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Client-side navigation target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NotificationEntry {
    /// Minimal unread entry with medium priority, addressed to everyone.
    pub fn new(id: i64, notification_type: NotificationType, title: impl Into<String>) -> Self {
        Self {
            id,
            notification_type,
            title: title.into(),
            message: String::new(),
            priority: Priority::Medium,
            read: false,
            recipient: None,
            recipient_role: None,
            created_at: Utc::now(),
            url: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_recipient(mut self, user_id: i64) -> Self {
        self.recipient = Some(user_id);
        self
    }

    pub fn with_recipient_role(mut self, role: impl Into<String>) -> Self {
        self.recipient_role = Some(role.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority == Priority::High
    }

    /// Addressed to neither a user nor a role.
    pub fn is_broadcast(&self) -> bool {
        self.recipient.is_none() && self.recipient_role.is_none()
    }

    /// Navigation target: explicit `url`, else the type's default route.
    pub fn target_route(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| self.notification_type.default_route().map(String::from))
    }
}

/// Notification list payload.
///
/// The backend answers either with a bare array or with a paginated
/// envelope; only the first page is read. Entries stay raw until
/// [`into_entries`](Self::into_entries) so one malformed entry cannot
/// reject the whole page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NotificationPage {
    Bare(Vec<serde_json::Value>),
    Paginated {
        results: Vec<serde_json::Value>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
    },
}

impl NotificationPage {
    /// Parse every entry, dropping the ones that do not parse.
    pub fn into_entries(self) -> Vec<NotificationEntry> {
        let raw = match self {
            NotificationPage::Bare(entries) => entries,
            NotificationPage::Paginated { results, .. } => results,
        };
        raw.into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                serde_json::from_value::<NotificationEntry>(value)
                    .map_err(|e| warn!(index, error = %e, "Skipping malformed notification"))
                    .ok()
            })
            .collect()
    }
}

/// Server-computed unread count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "unread_count")]
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_deserialize_full() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": 7,
            "username": "alice",
            "role": {"id": 2, "name": "Treasurer"},
            "is_superuser": false,
            "association": {"id": 1, "name": "Les Amis"}
        }))
        .unwrap();

        assert_eq!(profile.id, Some(7));
        assert_eq!(profile.role_name(), Some("Treasurer"));
        assert_eq!(profile.role(), Some(Role::Treasurer));
        assert_eq!(profile.association.unwrap().id, 1);
    }

    #[test]
    fn test_profile_deserialize_null_role() {
        let profile: UserProfile =
            serde_json::from_value(json!({"role": null, "is_superuser": true})).unwrap();
        assert!(profile.role().is_none());
        assert!(profile.is_superuser);
        assert!(profile.association.is_none());
    }

    #[test]
    fn test_viewer_from_profile() {
        let viewer = UserProfile::with_role("member").with_id(3).viewer();
        assert_eq!(viewer.user_id, Some(3));
        assert_eq!(viewer.role, Some(Role::Member));
    }

    #[test]
    fn test_entry_deserialize_defaults() {
        let entry: NotificationEntry = serde_json::from_value(json!({
            "id": 12,
            "notification_type": "meeting_scheduled",
            "title": "AG annuelle",
            "created_at": "2026-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(entry.notification_type, NotificationType::MeetingScheduled);
        assert_eq!(entry.priority, Priority::Medium);
        assert!(!entry.read);
        assert!(entry.is_broadcast());
        assert!(entry.url.is_none());
    }

    #[test]
    fn test_entry_accepts_is_read_alias() {
        let entry: NotificationEntry = serde_json::from_value(json!({
            "id": 1,
            "notification_type": "system",
            "title": "t",
            "priority": "high",
            "is_read": true,
            "created_at": "2026-03-01T10:00:00Z"
        }))
        .unwrap();
        assert!(entry.read);
        assert!(entry.is_high_priority());
    }

    #[test]
    fn test_target_route_prefers_url() {
        let entry = NotificationEntry::new(1, NotificationType::MeetingReminder, "x")
            .with_url("/meetings/42");
        assert_eq!(entry.target_route().as_deref(), Some("/meetings/42"));

        let entry = NotificationEntry::new(2, NotificationType::DonationReceived, "x");
        assert_eq!(entry.target_route().as_deref(), Some("/finance"));

        let entry = NotificationEntry::new(3, NotificationType::System, "x");
        assert!(entry.target_route().is_none());
    }

    #[test]
    fn test_page_bare_and_paginated() {
        let item = json!({
            "id": 1,
            "notification_type": "system",
            "title": "t",
            "created_at": "2026-03-01T10:00:00Z"
        });

        let bare: NotificationPage = serde_json::from_value(json!([item.clone()])).unwrap();
        assert_eq!(bare.into_entries().len(), 1);

        let paged: NotificationPage = serde_json::from_value(json!({
            "count": 40,
            "next": "http://x/notifications/?page=2",
            "results": [item]
        }))
        .unwrap();
        assert_eq!(paged.into_entries().len(), 1);
    }

    #[test]
    fn test_page_skips_malformed_entries() {
        let paged: NotificationPage = serde_json::from_value(json!({
            "results": [
                {
                    "id": 1,
                    "notification_type": "system",
                    "title": null,
                    "message": null,
                    "is_read": null,
                    "created_at": "2026-03-01T10:00:00Z"
                },
                {
                    "id": 2,
                    "notification_type": "budget_alert",
                    "title": "Budget",
                    "priority": "URGENT",
                    "created_at": "2026-03-01T10:00:00Z"
                },
                {
                    "notification_type": "system",
                    "title": "missing id",
                    "created_at": "2026-03-01T10:00:00Z"
                },
                {
                    "id": 4,
                    "notification_type": "system",
                    "title": "bad date",
                    "created_at": "yesterday"
                },
                {
                    "id": 5,
                    "notification_type": "member_joined",
                    "title": "New member",
                    "priority": "High",
                    "created_at": "2026-03-01T10:00:00Z"
                }
            ]
        }))
        .unwrap();

        let entries = paged.into_entries();
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2, 5]);
        assert_eq!(entries[0].title, "");
        assert_eq!(entries[0].message, "");
        assert!(!entries[0].read);
        assert_eq!(entries[1].priority, Priority::Medium);
        assert!(entries[2].is_high_priority());
    }

    #[test]
    fn test_priority_lenient() {
        let p: Priority = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(p, Priority::Medium);
        assert_eq!(Priority::parse_lenient(" LOW "), Priority::Low);
        assert_eq!(Priority::parse_lenient("critical"), Priority::Medium);
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), json!("high"));
    }

    #[test]
    fn test_unread_count_alias() {
        let c: UnreadCount = serde_json::from_value(json!({"unread_count": 4})).unwrap();
        assert_eq!(c.count, 4);
        let c: UnreadCount = serde_json::from_value(json!({"count": 2})).unwrap();
        assert_eq!(c.count, 2);
    }

    #[test]
    fn test_priority_display() {
        assert_eq!(Priority::High.to_string(), "high");
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
