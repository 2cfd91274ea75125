//! Notification reconciler.
//!
//! Keeps an eventually consistent local copy of the server's notification
//! list. Each poll tick runs one fetch-diff-notify cycle:
//!
//! 1. fetch the full list
//! 2. diff it against the cache and the ids already seen this session
//! 3. replace the cache wholesale
//! 4. hand the new entries to every listener
//! 5. toast (and desktop-notify) the new high-priority entries
//!
//! Every cycle takes a sequence number before fetching. A response is only
//! applied if no newer cycle has been applied in the meantime, so a slow
//! response can never resurrect an older server state.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use assoc_core::{ConsoleApi, NotificationEntry, Result, Viewer};

use crate::alerts::AlertBridge;
use crate::config::ReconcilerConfig;
use crate::listeners::{ListenerRegistry, Subscription};
use crate::navigation::Navigator;
use crate::visibility::filter_visible;

/// Lifecycle of a reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerStatus {
    /// `initialize` not called yet, or called without a token.
    Uninitialized,
    /// Poll task running.
    Polling,
    /// Stopped by `cleanup`. A later `initialize` starts polling again.
    Stopped,
}

/// Outcome of the most recent poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub at: DateTime<Utc>,
    pub new_count: usize,
    pub failed: bool,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: Vec<NotificationEntry>,
    /// Every id observed since the last cleanup.
    seen: HashSet<i64>,
    unread_count: u64,
    /// Sequence of the last response accepted into the cache.
    applied_seq: u64,
}

struct Lifecycle {
    status: ReconcilerStatus,
    shutdown_tx: Option<mpsc::Sender<()>>,
    last_poll: Option<PollSummary>,
}

/// Local view of server-side notifications with change fan-out.
///
/// Construct once at startup and share behind an `Arc`.
pub struct NotificationReconciler {
    api: Arc<dyn ConsoleApi>,
    config: ReconcilerConfig,
    alerts: AlertBridge,
    navigator: Option<Arc<dyn Navigator>>,
    listeners: ListenerRegistry,
    state: Mutex<CacheState>,
    lifecycle: Mutex<Lifecycle>,
    next_seq: AtomicU64,
}

impl NotificationReconciler {
    pub fn new(api: Arc<dyn ConsoleApi>, config: ReconcilerConfig) -> Self {
        let alerts = AlertBridge::default().with_desktop_enabled(config.desktop_enabled);
        Self {
            api,
            config,
            alerts,
            navigator: None,
            listeners: ListenerRegistry::new(),
            state: Mutex::new(CacheState::default()),
            lifecycle: Mutex::new(Lifecycle {
                status: ReconcilerStatus::Uninitialized,
                shutdown_tx: None,
                last_poll: None,
            }),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Replace the alert bridge. The desktop switch follows the reconciler config.
    pub fn with_alerts(mut self, alerts: AlertBridge) -> Self {
        self.alerts = alerts.with_desktop_enabled(self.config.desktop_enabled);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn alerts(&self) -> &AlertBridge {
        &self.alerts
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Start polling. Must be called from within a Tokio runtime.
    ///
    /// Returns `false` without doing anything when no auth token is
    /// available. Calling it while already polling is a no-op.
    pub fn initialize(self: &Arc<Self>) -> bool {
        if !self.api.has_token() {
            info!(subsystem = "notify", "No auth token, notification polling not started");
            return false;
        }

        let shutdown_rx = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.status == ReconcilerStatus::Polling {
                debug!(subsystem = "notify", "Notification polling already running");
                return true;
            }
            let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
            lifecycle.shutdown_tx = Some(shutdown_tx);
            lifecycle.status = ReconcilerStatus::Polling;
            shutdown_rx
        };

        let reconciler = Arc::clone(self);
        tokio::spawn(async move {
            reconciler.poll_loop(shutdown_rx).await;
        });

        info!(
            subsystem = "notify",
            poll_interval_secs = self.config.poll_interval_secs,
            "Notification polling started"
        );
        true
    }

    /// Stop polling and drop every listener.
    ///
    /// A cycle already in flight is allowed to finish; no new cycle starts.
    pub fn cleanup(&self) {
        {
            let mut lifecycle = self.lifecycle();
            if let Some(shutdown_tx) = lifecycle.shutdown_tx.take() {
                let _ = shutdown_tx.try_send(());
            }
            if lifecycle.status == ReconcilerStatus::Polling {
                lifecycle.status = ReconcilerStatus::Stopped;
            }
        }
        self.listeners.clear();
        self.state().seen.clear();
        info!(subsystem = "notify", "Notification polling stopped");
    }

    pub fn status(&self) -> ReconcilerStatus {
        self.lifecycle().status
    }

    pub fn last_poll(&self) -> Option<PollSummary> {
        self.lifecycle().last_poll.clone()
    }

    #[instrument(skip(self, shutdown_rx), fields(subsystem = "notify"))]
    async fn poll_loop(self: Arc<Self>, mut shutdown_rx: mpsc::Receiver<()>) {
        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    debug!("Poll loop received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        warn!(error = %e, "Notification poll failed");
                    }
                }
            }
        }
    }

    // =========================================================================
    // FETCH-DIFF-NOTIFY
    // =========================================================================

    /// Run one fetch-diff-notify cycle and return the newly observed entries.
    ///
    /// A response overtaken by a newer cycle is dropped and yields no entries.
    #[instrument(skip(self), fields(subsystem = "notify", op = "refresh"))]
    pub async fn refresh(&self) -> Result<Vec<NotificationEntry>> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();

        let fetched = match self.api.list_notifications().await {
            Ok(fetched) => fetched,
            Err(e) => {
                self.record_poll(0, true);
                return Err(e);
            }
        };
        let total = fetched.len();

        let Some(new_entries) = self.apply(seq, fetched) else {
            debug!(seq, "Dropped stale notification response");
            return Ok(Vec::new());
        };

        debug!(
            seq,
            result_count = total,
            new_count = new_entries.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Notification cycle applied"
        );
        self.record_poll(new_entries.len(), false);

        if !new_entries.is_empty() {
            self.listeners.notify(&new_entries);
            self.alerts.alert_high_priority(&new_entries).await;
        }
        Ok(new_entries)
    }

    /// Accept a fetched list into the cache unless a newer one was applied.
    ///
    /// Returns the entries that are neither cached nor already seen.
    fn apply(&self, seq: u64, fetched: Vec<NotificationEntry>) -> Option<Vec<NotificationEntry>> {
        let mut guard = self.state();
        if seq <= guard.applied_seq {
            return None;
        }
        guard.applied_seq = seq;

        let state = &mut *guard;
        let cached: HashSet<i64> = state.entries.iter().map(|e| e.id).collect();
        let seen = &mut state.seen;
        let new_entries: Vec<NotificationEntry> = fetched
            .iter()
            .filter(|e| !cached.contains(&e.id) && seen.insert(e.id))
            .cloned()
            .collect();
        seen.extend(fetched.iter().map(|e| e.id));
        state.entries = fetched;

        Some(new_entries)
    }

    fn record_poll(&self, new_count: usize, failed: bool) {
        self.lifecycle().last_poll = Some(PollSummary {
            at: Utc::now(),
            new_count,
            failed,
        });
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Current cache, unfiltered.
    pub fn notifications(&self) -> Vec<NotificationEntry> {
        self.state().entries.clone()
    }

    /// Cached list, fetching it once if the cache is empty.
    ///
    /// The fetch fills the cache without notifying listeners. Failures are
    /// logged and yield an empty list.
    #[instrument(skip(self), fields(subsystem = "notify", op = "get_notifications"))]
    pub async fn get_notifications(&self) -> Vec<NotificationEntry> {
        let cached = self.notifications();
        if !cached.is_empty() {
            return cached;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        match self.api.list_notifications().await {
            Ok(fetched) => {
                if self.apply(seq, fetched).is_none() {
                    debug!(seq, "Dropped stale notification response");
                }
                self.notifications()
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch notifications");
                Vec::new()
            }
        }
    }

    /// Cached entries visible to `viewer`.
    pub fn visible_notifications(&self, viewer: &Viewer) -> Vec<NotificationEntry> {
        filter_visible(&self.state().entries, viewer)
    }

    /// Last known unread count.
    pub fn unread_count(&self) -> u64 {
        self.state().unread_count
    }

    /// Unread count from the server, falling back to counting the cache.
    #[instrument(skip(self), fields(subsystem = "notify", op = "get_unread_count"))]
    pub async fn get_unread_count(&self) -> u64 {
        let count = match self.api.unread_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Unread count unavailable, counting cached entries");
                self.state().entries.iter().filter(|e| !e.read).count() as u64
            }
        };
        self.state().unread_count = count;
        count
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Acknowledge one notification.
    ///
    /// Local state changes only after the server accepted the write.
    #[instrument(skip(self), fields(subsystem = "notify", op = "mark_as_read"))]
    pub async fn mark_as_read(&self, id: i64) -> bool {
        if let Err(e) = self.api.mark_as_read(id).await {
            warn!(notification_id = id, error = %e, "Failed to mark notification as read");
            return false;
        }

        let mut state = self.state();
        if let Some(entry) = state.entries.iter_mut().find(|e| e.id == id) {
            entry.read = true;
        }
        state.unread_count = state.unread_count.saturating_sub(1);
        debug!(notification_id = id, unread = state.unread_count, "Notification marked as read");
        true
    }

    /// Acknowledge every notification.
    #[instrument(skip(self), fields(subsystem = "notify", op = "mark_all_as_read"))]
    pub async fn mark_all_as_read(&self) -> bool {
        if let Err(e) = self.api.mark_all_as_read().await {
            warn!(error = %e, "Failed to mark all notifications as read");
            return false;
        }

        let mut state = self.state();
        state.entries.iter_mut().for_each(|e| e.read = true);
        state.unread_count = 0;
        true
    }

    /// Mark the entry read, then navigate to its target route.
    ///
    /// Navigation happens even if the acknowledgment failed. Returns the
    /// route, if the entry has one.
    pub async fn handle_notification_click(&self, entry: &NotificationEntry) -> Option<String> {
        self.mark_as_read(entry.id).await;

        let route = entry.target_route();
        if let (Some(route), Some(navigator)) = (&route, &self.navigator) {
            navigator.navigate(route);
        }
        route
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Register a listener for newly observed entries.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[NotificationEntry]) -> Result<()> + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
