//! Core traits for assoc-console abstractions.
//!
//! These traits define the boundary to the REST backend and to persisted
//! credentials, enabling pluggable transports and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NotificationEntry, UserProfile};

// =============================================================================
// BACKEND
// =============================================================================

/// Authenticated calls against the association backend.
///
/// Implementations return [`crate::Error::Unauthenticated`] when no bearer
/// token is available.
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// Current user's profile (role, superuser flag, association).
    async fn fetch_profile(&self) -> Result<UserProfile>;

    /// Full current notification list, in server order.
    async fn list_notifications(&self) -> Result<Vec<NotificationEntry>>;

    /// Server-computed unread count.
    async fn unread_count(&self) -> Result<u64>;

    /// Acknowledge a single notification.
    async fn mark_as_read(&self, id: i64) -> Result<()>;

    /// Acknowledge every notification of the user.
    async fn mark_all_as_read(&self) -> Result<()>;

    /// Whether a bearer token is currently available.
    fn has_token(&self) -> bool;
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Persisted bearer token storage.
pub trait TokenStore: Send + Sync {
    /// Current token, if logged in. Blank tokens count as absent.
    fn token(&self) -> Option<String>;

    /// Persist a new token (login).
    fn store(&self, token: &str) -> Result<()>;

    /// Forget the token (logout).
    fn clear(&self) -> Result<()>;
}
