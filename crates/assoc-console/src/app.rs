//! Composition root: one resolver and one reconciler per process.

use std::sync::Arc;

use assoc_client::{token_store_from_config, HttpConsoleApi};
use assoc_core::{ConsoleApi, PermissionResolver, Result, TokenStore, Viewer};
use assoc_notify::{AlertBridge, CommandNotifier, NotificationReconciler};

use crate::config::ConsoleConfig;
use crate::output::{PrintNavigator, StdoutToasts};

/// Shared session services handed to every command.
pub struct Console {
    pub api: Arc<dyn ConsoleApi>,
    pub tokens: Arc<dyn TokenStore>,
    pub resolver: PermissionResolver,
    pub reconciler: Arc<NotificationReconciler>,
}

impl Console {
    pub fn new(
        api: Arc<dyn ConsoleApi>,
        tokens: Arc<dyn TokenStore>,
        reconciler: NotificationReconciler,
    ) -> Self {
        Self {
            api,
            tokens,
            resolver: PermissionResolver::new(),
            reconciler: Arc::new(reconciler),
        }
    }

    /// Wire the HTTP backend, stdout sinks, and the desktop notifier.
    pub fn from_config(config: ConsoleConfig) -> Result<Self> {
        config.validate()?;
        let tokens = token_store_from_config(&config.client);
        let api: Arc<dyn ConsoleApi> = Arc::new(HttpConsoleApi::new(config.client, tokens.clone())?);

        let alerts = AlertBridge::new(Arc::new(StdoutToasts), Arc::new(CommandNotifier::default()));
        let reconciler = NotificationReconciler::new(api.clone(), config.reconciler)
            .with_alerts(alerts)
            .with_navigator(Arc::new(PrintNavigator));

        Ok(Self::new(api, tokens, reconciler))
    }

    /// Resolve the profile and return who is looking.
    pub async fn viewer(&self) -> Viewer {
        self.resolver.refresh(self.api.as_ref()).await;
        self.resolver
            .profile()
            .map(|p| p.viewer())
            .unwrap_or_default()
    }
}
