//! Centralized default constants for assoc-console.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates and the binary reference these constants instead of defining their
//! own magic numbers.

// =============================================================================
// BACKEND
// =============================================================================

/// Default REST backend base URL.
pub const API_URL: &str = "http://127.0.0.1:8000/api";

/// Default HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Token file path, relative to the platform config directory.
pub const TOKEN_FILE_RELATIVE: &str = "assoc-console/token";

// =============================================================================
// ENDPOINTS
// =============================================================================

/// Current user profile (role, superuser flag, association).
pub const PROFILE_PATH: &str = "/auth/profile/";

/// Full notification list.
pub const NOTIFICATIONS_PATH: &str = "/notifications/";

/// Server-computed unread count.
pub const UNREAD_COUNT_PATH: &str = "/notifications/unread_count/";

/// Bulk acknowledgment.
pub const MARK_ALL_READ_PATH: &str = "/notifications/mark_all_as_read/";

/// Single acknowledgment, `{id}` is substituted.
pub const MARK_READ_PATH_TEMPLATE: &str = "/notifications/{id}/mark_as_read/";

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Polling period of the notification reconciler in seconds.
pub const POLL_INTERVAL_SECS: u64 = 30;

/// Wire-tag prefix shared by every meeting-related notification type.
pub const MEETING_TYPE_PREFIX: &str = "meeting";

/// Application name shown as the desktop notification summary prefix.
pub const APP_NAME: &str = "assoc-console";

/// Wire-tag prefixes of the finance notification families.
pub const TRANSACTION_TYPE_PREFIX: &str = "transaction";
pub const DONATION_TYPE_PREFIX: &str = "donation";

/// Desktop notification command; its availability grants permission.
pub const DESKTOP_NOTIFY_COMMAND: &str = "notify-send";

/// Upper bound for one desktop permission request or display, in seconds.
pub const DESKTOP_NOTIFY_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// ROUTES
// =============================================================================

/// Meetings view.
pub const ROUTE_MEETINGS: &str = "/meetings";

/// Finance view (transactions, budgets, donations).
pub const ROUTE_FINANCE: &str = "/finance";

/// Members view.
pub const ROUTE_MEMBERS: &str = "/members";
