//! In-memory backend for deterministic testing.
//!
//! Enabled with the `mock` feature. Holds server-side state, records every
//! call, and can be scripted with delayed or failing list responses.
//!
//! ## Usage
//!
//! ```ignore
//! use assoc_core::mock::MockConsoleApi;
//! use assoc_core::{ConsoleApi, NotificationEntry, NotificationType};
//!
//! #[tokio::test]
//! async fn test_with_mock_api() {
//!     let api = MockConsoleApi::new()
//!         .with_notifications(vec![NotificationEntry::new(1, NotificationType::System, "hi")]);
//!
//!     let entries = api.list_notifications().await.unwrap();
//!     assert_eq!(entries.len(), 1);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{NotificationEntry, UserProfile};
use crate::traits::ConsoleApi;

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    FetchProfile,
    ListNotifications,
    UnreadCount,
    MarkAsRead(i64),
    MarkAllAsRead,
}

/// One scripted answer for `list_notifications`.
#[derive(Debug, Clone)]
struct ScriptedList {
    entries: Option<Vec<NotificationEntry>>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct MockState {
    token: bool,
    profile: Option<UserProfile>,
    notifications: Vec<NotificationEntry>,
    scripted: VecDeque<ScriptedList>,
    unread: Option<u64>,
    fail_profile: bool,
    fail_list: bool,
    fail_unread: bool,
    fail_writes: bool,
    calls: Vec<MockCall>,
}

/// Mock backend for testing.
#[derive(Clone)]
pub struct MockConsoleApi {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockConsoleApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConsoleApi {
    /// Logged-in mock with a plain member profile and no notifications.
    pub fn new() -> Self {
        let state = MockState {
            token: true,
            profile: Some(UserProfile::with_role("member")),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_profile(self, profile: UserProfile) -> Self {
        self.lock().profile = Some(profile);
        self
    }

    pub fn with_notifications(self, entries: Vec<NotificationEntry>) -> Self {
        self.set_notifications(entries);
        self
    }

    pub fn with_unread_count(self, count: u64) -> Self {
        self.lock().unread = Some(count);
        self
    }

    /// No bearer token: every call answers `Unauthenticated`.
    pub fn without_token(self) -> Self {
        self.lock().token = false;
        self
    }

    /// Replace server-side notifications.
    pub fn set_notifications(&self, entries: Vec<NotificationEntry>) {
        self.lock().notifications = entries;
    }

    /// Queue a one-shot list answer, returned after `delay`.
    pub fn push_list_response(&self, entries: Vec<NotificationEntry>, delay: Duration) {
        self.lock().scripted.push_back(ScriptedList {
            entries: Some(entries),
            delay,
        });
    }

    /// Queue a one-shot list failure.
    pub fn push_list_failure(&self) {
        self.lock().scripted.push_back(ScriptedList {
            entries: None,
            delay: Duration::ZERO,
        });
    }

    pub fn set_fail_profile(&self, fail: bool) {
        self.lock().fail_profile = fail;
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    pub fn set_fail_unread(&self, fail: bool) {
        self.lock().fail_unread = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Server-side copy of the notifications.
    pub fn server_notifications(&self) -> Vec<NotificationEntry> {
        self.lock().notifications.clone()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| **c == MockCall::ListNotifications)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: MockCall) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.token {
            Ok(())
        } else {
            Err(Error::Unauthenticated("no token in mock".to_string()))
        }
    }
}

fn unavailable() -> Error {
    Error::Status {
        status: 503,
        message: "mock failure".to_string(),
    }
}

#[async_trait]
impl ConsoleApi for MockConsoleApi {
    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.record(MockCall::FetchProfile)?;
        let state = self.lock();
        if state.fail_profile {
            return Err(unavailable());
        }
        state
            .profile
            .clone()
            .ok_or_else(|| Error::NotFound("profile".to_string()))
    }

    async fn list_notifications(&self) -> Result<Vec<NotificationEntry>> {
        self.record(MockCall::ListNotifications)?;
        let scripted = {
            let mut state = self.lock();
            if state.fail_list {
                return Err(unavailable());
            }
            state.scripted.pop_front()
        };

        match scripted {
            Some(script) => {
                if !script.delay.is_zero() {
                    tokio::time::sleep(script.delay).await;
                }
                script.entries.ok_or_else(unavailable)
            }
            None => {
                let entries = self.lock().notifications.clone();
                Ok(entries)
            }
        }
    }

    async fn unread_count(&self) -> Result<u64> {
        self.record(MockCall::UnreadCount)?;
        let state = self.lock();
        if state.fail_unread {
            return Err(unavailable());
        }
        Ok(state
            .unread
            .unwrap_or_else(|| state.notifications.iter().filter(|n| !n.read).count() as u64))
    }

    async fn mark_as_read(&self, id: i64) -> Result<()> {
        self.record(MockCall::MarkAsRead(id))?;
        let mut state = self.lock();
        if state.fail_writes {
            return Err(unavailable());
        }
        match state.notifications.iter_mut().find(|n| n.id == id) {
            Some(entry) => {
                entry.read = true;
                Ok(())
            }
            None => Err(Error::NotFound(format!("notification {}", id))),
        }
    }

    async fn mark_all_as_read(&self) -> Result<()> {
        self.record(MockCall::MarkAllAsRead)?;
        let mut state = self.lock();
        if state.fail_writes {
            return Err(unavailable());
        }
        state.notifications.iter_mut().for_each(|n| n.read = true);
        Ok(())
    }

    fn has_token(&self) -> bool {
        self.lock().token
    }
}
