//! Notification type catalog.
//!
//! Every known wire tag maps to an icon id and an optional default route.
//! Unknown tags are kept verbatim in [`NotificationType::Other`] and fall back
//! to a generic icon. They still get the route of their family when the tag
//! carries a meeting, transaction or donation prefix.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DONATION_TYPE_PREFIX, MEETING_TYPE_PREFIX, ROUTE_FINANCE, ROUTE_MEETINGS, ROUTE_MEMBERS,
    TRANSACTION_TYPE_PREFIX,
};

/// Icon used for tags the catalog does not know.
pub const FALLBACK_ICON: &str = "bell";

/// Presentation metadata attached to a notification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub icon: &'static str,
    pub default_route: Option<&'static str>,
}

/// Notification type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    MeetingScheduled,
    MeetingUpdated,
    MeetingCancelled,
    MeetingReminder,
    TransactionCreated,
    TransactionValidated,
    TransactionRejected,
    DonationReceived,
    BudgetAlert,
    UserJoined,
    UserLeft,
    UserPending,
    ProjectCreated,
    ProjectUpdated,
    TaskAssigned,
    TaskCompleted,
    ReportReady,
    System,
    Other(String),
}

impl NotificationType {
    /// Wire tag as sent by the backend.
    pub fn tag(&self) -> &str {
        match self {
            Self::MeetingScheduled => "meeting_scheduled",
            Self::MeetingUpdated => "meeting_updated",
            Self::MeetingCancelled => "meeting_cancelled",
            Self::MeetingReminder => "meeting_reminder",
            Self::TransactionCreated => "transaction_created",
            Self::TransactionValidated => "transaction_validated",
            Self::TransactionRejected => "transaction_rejected",
            Self::DonationReceived => "donation_received",
            Self::BudgetAlert => "budget_alert",
            Self::UserJoined => "user_joined",
            Self::UserLeft => "user_left",
            Self::UserPending => "user_pending",
            Self::ProjectCreated => "project_created",
            Self::ProjectUpdated => "project_updated",
            Self::TaskAssigned => "task_assigned",
            Self::TaskCompleted => "task_completed",
            Self::ReportReady => "report_ready",
            Self::System => "system",
            Self::Other(tag) => tag,
        }
    }

    /// Icon and default route for this type.
    pub fn info(&self) -> TypeInfo {
        let (icon, default_route) = match self {
            Self::MeetingScheduled => ("calendar", Some(ROUTE_MEETINGS)),
            Self::MeetingUpdated => ("calendar-edit", Some(ROUTE_MEETINGS)),
            Self::MeetingCancelled => ("calendar-x", Some(ROUTE_MEETINGS)),
            Self::MeetingReminder => ("bell-ring", Some(ROUTE_MEETINGS)),
            Self::TransactionCreated => ("receipt", Some(ROUTE_FINANCE)),
            Self::TransactionValidated => ("check-circle", Some(ROUTE_FINANCE)),
            Self::TransactionRejected => ("x-circle", Some(ROUTE_FINANCE)),
            Self::DonationReceived => ("gift", Some(ROUTE_FINANCE)),
            Self::BudgetAlert => ("alert-triangle", None),
            Self::UserJoined => ("user-plus", Some(ROUTE_MEMBERS)),
            Self::UserLeft => ("user-minus", Some(ROUTE_MEMBERS)),
            Self::UserPending => ("user-clock", None),
            Self::ProjectCreated => ("folder-plus", None),
            Self::ProjectUpdated => ("folder", None),
            Self::TaskAssigned => ("clipboard", None),
            Self::TaskCompleted => ("clipboard-check", None),
            Self::ReportReady => ("file-text", None),
            Self::System => ("info", None),
            Self::Other(_) if self.is_meeting() => (FALLBACK_ICON, Some(ROUTE_MEETINGS)),
            Self::Other(_) if self.is_finance() => (FALLBACK_ICON, Some(ROUTE_FINANCE)),
            Self::Other(_) => (FALLBACK_ICON, None),
        };
        TypeInfo {
            icon,
            default_route,
        }
    }

    pub fn icon(&self) -> &'static str {
        self.info().icon
    }

    pub fn default_route(&self) -> Option<&'static str> {
        self.info().default_route
    }

    /// Meeting-related, by prefix match on the wire tag.
    pub fn is_meeting(&self) -> bool {
        self.tag().starts_with(MEETING_TYPE_PREFIX)
    }

    /// Transaction or donation related, by prefix match on the wire tag.
    pub fn is_finance(&self) -> bool {
        let tag = self.tag();
        tag.starts_with(TRANSACTION_TYPE_PREFIX) || tag.starts_with(DONATION_TYPE_PREFIX)
    }
}

impl From<String> for NotificationType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "meeting_scheduled" => Self::MeetingScheduled,
            "meeting_updated" => Self::MeetingUpdated,
            "meeting_cancelled" => Self::MeetingCancelled,
            "meeting_reminder" => Self::MeetingReminder,
            "transaction_created" => Self::TransactionCreated,
            "transaction_validated" => Self::TransactionValidated,
            "transaction_rejected" => Self::TransactionRejected,
            "donation_received" => Self::DonationReceived,
            "budget_alert" => Self::BudgetAlert,
            "user_joined" => Self::UserJoined,
            "user_left" => Self::UserLeft,
            "user_pending" => Self::UserPending,
            "project_created" => Self::ProjectCreated,
            "project_updated" => Self::ProjectUpdated,
            "task_assigned" => Self::TaskAssigned,
            "task_completed" => Self::TaskCompleted,
            "report_ready" => Self::ReportReady,
            "system" => Self::System,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for NotificationType {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<NotificationType> for String {
    fn from(t: NotificationType) -> Self {
        match t {
            NotificationType::Other(tag) => tag,
            known => known.tag().to_string(),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
