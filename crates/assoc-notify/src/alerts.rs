//! High-priority alert delivery: in-app toasts and desktop notifications.
//!
//! Desktop permission is requested lazily, the first time a high-priority
//! entry needs it, and the answer is kept for the rest of the process.
//! Every desktop call is bounded by a timeout so a stuck notifier cannot
//! hold up the poll cycle that raised the alert.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use assoc_core::defaults;
use assoc_core::{Error, NotificationEntry, Priority, Result};

// =============================================================================
// TOASTS
// =============================================================================

/// In-app toast shown for a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub notification_id: i64,
    pub title: String,
    pub message: String,
    pub icon: &'static str,
    pub priority: Priority,
}

impl Toast {
    pub fn from_entry(entry: &NotificationEntry) -> Self {
        Self {
            notification_id: entry.id,
            title: entry.title.clone(),
            message: entry.message.clone(),
            icon: entry.notification_type.icon(),
            priority: entry.priority,
        }
    }
}

/// Toast layer.
pub trait ToastSink: Send + Sync {
    fn show(&self, toast: Toast);
}

/// Toast sink that writes to the log.
#[derive(Debug, Default)]
pub struct LogToastSink;

impl ToastSink for LogToastSink {
    fn show(&self, toast: Toast) {
        info!(
            notification_id = toast.notification_id,
            icon = toast.icon,
            title = %toast.title,
            "Toast"
        );
    }
}

// =============================================================================
// DESKTOP
// =============================================================================

/// Payload for an OS-level notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopNotification {
    pub summary: String,
    pub body: String,
    pub icon: &'static str,
}

impl DesktopNotification {
    pub fn from_entry(entry: &NotificationEntry) -> Self {
        Self {
            summary: format!("{}: {}", defaults::APP_NAME, entry.title),
            body: entry.message.clone(),
            icon: entry.notification_type.icon(),
        }
    }
}

/// OS notification facility, gated by a permission the platform controls.
#[async_trait]
pub trait DesktopNotifier: Send + Sync {
    /// Ask for permission. Called at most once per [`AlertBridge`].
    async fn request_permission(&self) -> bool;

    /// Display a notification. Only called after permission was granted.
    async fn show(&self, notification: &DesktopNotification) -> Result<()>;
}

/// Notifier that never gets permission.
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl DesktopNotifier for NullNotifier {
    async fn request_permission(&self) -> bool {
        false
    }

    async fn show(&self, _notification: &DesktopNotification) -> Result<()> {
        Ok(())
    }
}

/// Notifier that shells out to a `notify-send` compatible command.
///
/// Permission is granted when the command can be executed.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: String,
}

impl Default for CommandNotifier {
    fn default() -> Self {
        Self::new(defaults::DESKTOP_NOTIFY_COMMAND)
    }
}

impl CommandNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl DesktopNotifier for CommandNotifier {
    async fn request_permission(&self) -> bool {
        let check = Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match check {
            Ok(status) if status.success() => true,
            Ok(status) => {
                debug!(command = %self.command, code = ?status.code(), "Desktop notifier check failed");
                false
            }
            Err(e) => {
                debug!(command = %self.command, error = %e, "Desktop notifier unavailable");
                false
            }
        }
    }

    async fn show(&self, notification: &DesktopNotification) -> Result<()> {
        let status = Command::new(&self.command)
            .arg("--app-name")
            .arg(defaults::APP_NAME)
            .arg("--urgency")
            .arg("critical")
            .arg("--icon")
            .arg(notification.icon)
            .arg(&notification.summary)
            .arg(&notification.body)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Internal(format!(
                "{} exited with {:?}",
                self.command,
                status.code()
            )))
        }
    }
}

// =============================================================================
// BRIDGE
// =============================================================================

/// Fans a high-priority entry out to the toast layer and the desktop.
pub struct AlertBridge {
    toasts: Arc<dyn ToastSink>,
    desktop: Arc<dyn DesktopNotifier>,
    desktop_enabled: bool,
    desktop_timeout: Duration,
    permission: OnceCell<bool>,
}

impl Default for AlertBridge {
    fn default() -> Self {
        Self::new(Arc::new(LogToastSink), Arc::new(NullNotifier))
    }
}

impl AlertBridge {
    pub fn new(toasts: Arc<dyn ToastSink>, desktop: Arc<dyn DesktopNotifier>) -> Self {
        Self {
            toasts,
            desktop,
            desktop_enabled: true,
            desktop_timeout: Duration::from_secs(defaults::DESKTOP_NOTIFY_TIMEOUT_SECS),
            permission: OnceCell::new(),
        }
    }

    pub fn with_desktop_enabled(mut self, enabled: bool) -> Self {
        self.desktop_enabled = enabled;
        self
    }

    /// Bound for one permission request or one desktop display.
    pub fn with_desktop_timeout(mut self, timeout: Duration) -> Self {
        self.desktop_timeout = timeout;
        self
    }

    /// Cached permission answer, if it was already requested.
    pub fn desktop_permission(&self) -> Option<bool> {
        self.permission.get().copied()
    }

    async fn ensure_permission(&self) -> bool {
        *self
            .permission
            .get_or_init(|| async {
                let granted =
                    match tokio::time::timeout(self.desktop_timeout, self.desktop.request_permission())
                        .await
                    {
                        Ok(granted) => granted,
                        Err(_) => {
                            warn!(
                                timeout_ms = self.desktop_timeout.as_millis() as u64,
                                "Desktop permission request timed out"
                            );
                            false
                        }
                    };
                info!(granted, "Desktop notification permission requested");
                granted
            })
            .await
    }

    /// Toast plus desktop notification for one entry.
    ///
    /// Never fails: a denied permission, a failing notifier or one that
    /// does not answer within the desktop timeout is skipped.
    pub async fn alert(&self, entry: &NotificationEntry) {
        self.toasts.show(Toast::from_entry(entry));

        if !self.desktop_enabled || !self.ensure_permission().await {
            return;
        }
        let notification = DesktopNotification::from_entry(entry);
        match tokio::time::timeout(self.desktop_timeout, self.desktop.show(&notification)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(notification_id = entry.id, error = %e, "Desktop notification failed");
            }
            Err(_) => {
                warn!(
                    notification_id = entry.id,
                    timeout_ms = self.desktop_timeout.as_millis() as u64,
                    "Desktop notification timed out"
                );
            }
        }
    }

    /// Alert every high-priority entry of a batch. Returns how many were alerted.
    pub async fn alert_high_priority(&self, entries: &[NotificationEntry]) -> usize {
        let mut alerted = 0;
        for entry in entries.iter().filter(|e| e.is_high_priority()) {
            self.alert(entry).await;
            alerted += 1;
        }
        alerted
    }
}
