//! Console configuration.

use assoc_client::ClientConfig;
use assoc_core::Result;
use assoc_notify::ReconcilerConfig;

/// Full configuration of the console binary.
#[derive(Debug, Clone, Default)]
pub struct ConsoleConfig {
    pub client: ClientConfig,
    pub reconciler: ReconcilerConfig,
}

impl ConsoleConfig {
    /// Read every section from the environment.
    ///
    /// See [`ClientConfig::from_env`] and [`ReconcilerConfig::from_env`] for
    /// the variables.
    pub fn from_env() -> Self {
        Self {
            client: ClientConfig::from_env(),
            reconciler: ReconcilerConfig::from_env(),
        }
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn with_reconciler(mut self, reconciler: ReconcilerConfig) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.client.validate()
    }
}
