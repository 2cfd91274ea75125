//! Reconciler configuration.

use std::time::Duration;

use assoc_core::defaults;

/// Configuration for the notification reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Polling period in seconds.
    pub poll_interval_secs: u64,
    /// Whether high-priority entries may raise desktop notifications.
    pub desktop_enabled: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
            desktop_enabled: true,
        }
    }
}

impl ReconcilerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ASSOC_POLL_INTERVAL_SECS` | `30` | Poll period, minimum 1 |
    /// | `ASSOC_DESKTOP_NOTIFICATIONS` | `true` | Allow desktop notifications |
    pub fn from_env() -> Self {
        let poll_interval_secs = std::env::var("ASSOC_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::POLL_INTERVAL_SECS)
            .max(1);

        let desktop_enabled = std::env::var("ASSOC_DESKTOP_NOTIFICATIONS")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            poll_interval_secs,
            desktop_enabled,
        }
    }

    /// Set the poll period (clamped to at least one second).
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs.max(1);
        self
    }

    /// Enable or disable desktop notifications.
    pub fn with_desktop_enabled(mut self, enabled: bool) -> Self {
        self.desktop_enabled = enabled;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
