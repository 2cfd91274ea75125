//! # assoc-notify
//!
//! Notification reconciler for assoc-console.
//!
//! This crate provides:
//! - [`NotificationReconciler`]: polling, diffing, and acknowledgment of
//!   server-side notifications
//! - A listener registry with per-listener failure isolation
//! - Role-scoped visibility filtering
//! - High-priority alerts through toasts and desktop notifications
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use assoc_core::mock::MockConsoleApi;
//! use assoc_notify::{NotificationReconciler, ReconcilerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let api = Arc::new(MockConsoleApi::new());
//!     let reconciler = Arc::new(NotificationReconciler::new(api, ReconcilerConfig::from_env()));
//!
//!     let _sub = reconciler.subscribe(|entries| {
//!         println!("{} new notifications", entries.len());
//!         Ok(())
//!     });
//!     reconciler.initialize();
//! }
//! ```

pub mod alerts;
pub mod config;
pub mod listeners;
pub mod navigation;
pub mod reconciler;
pub mod visibility;

pub use alerts::{
    AlertBridge, CommandNotifier, DesktopNotification, DesktopNotifier, LogToastSink,
    NullNotifier, Toast, ToastSink,
};
pub use config::ReconcilerConfig;
pub use listeners::{Listener, ListenerRegistry, Subscription};
pub use navigation::{Navigator, RecordingNavigator};
pub use reconciler::{NotificationReconciler, PollSummary, ReconcilerStatus};
pub use visibility::{filter_visible, is_visible, FULL_VISIBILITY_ROLES};
