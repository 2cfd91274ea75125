//! reqwest-based implementation of [`ConsoleApi`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use assoc_core::defaults;
use assoc_core::{
    ConsoleApi, Error, NotificationEntry, NotificationPage, Result, TokenStore, UnreadCount,
    UserProfile,
};

use crate::config::ClientConfig;
use crate::error::{to_console_error, ApiErrorCode};
use crate::token::token_store_from_config;

/// Authenticated JSON client for the association backend.
pub struct HttpConsoleApi {
    client: Client,
    config: ClientConfig,
    tokens: Arc<dyn TokenStore>,
}

impl HttpConsoleApi {
    /// Create a client with an explicit token store.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        debug!(base_url = %config.base_url, "Initialized backend client");
        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    /// Create a client whose token store is chosen by the configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let tokens = token_store_from_config(&config);
        Self::new(config, tokens)
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> Result<String> {
        self.tokens
            .token()
            .map(|t| format!("Bearer {}", t))
            .ok_or_else(|| Error::Unauthenticated("no auth token stored".to_string()))
    }

    /// Build an authenticated GET request.
    fn build_get_request(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .get(self.url(path))
            .header("Authorization", self.bearer()?)
            .header("Accept", "application/json"))
    }

    /// Build an authenticated POST request.
    fn build_post_request(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .post(self.url(path))
            .header("Authorization", self.bearer()?)
            .header("Accept", "application/json"))
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response> {
        let started = Instant::now();
        let response = req.send().await?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            url = %response.url(),
            "Backend responded"
        );

        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let code = ApiErrorCode::from_status(status.as_u16());
        debug!(?code, retryable = code.is_retryable(), "Backend request rejected");
        Err(to_console_error(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let response = self.send(req).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ConsoleApi for HttpConsoleApi {
    #[instrument(skip(self), fields(subsystem = "client", op = "fetch_profile"))]
    async fn fetch_profile(&self) -> Result<UserProfile> {
        let req = self.build_get_request(defaults::PROFILE_PATH)?;
        self.send_json(req).await
    }

    #[instrument(skip(self), fields(subsystem = "client", op = "list_notifications"))]
    async fn list_notifications(&self) -> Result<Vec<NotificationEntry>> {
        let req = self.build_get_request(defaults::NOTIFICATIONS_PATH)?;
        let page: NotificationPage = self.send_json(req).await?;
        let entries = page.into_entries();
        debug!(result_count = entries.len(), "Fetched notifications");
        Ok(entries)
    }

    #[instrument(skip(self), fields(subsystem = "client", op = "unread_count"))]
    async fn unread_count(&self) -> Result<u64> {
        let req = self.build_get_request(defaults::UNREAD_COUNT_PATH)?;
        let count: UnreadCount = self.send_json(req).await?;
        Ok(count.count)
    }

    #[instrument(skip(self), fields(subsystem = "client", op = "mark_as_read"))]
    async fn mark_as_read(&self, id: i64) -> Result<()> {
        let path = defaults::MARK_READ_PATH_TEMPLATE.replace("{id}", &id.to_string());
        let req = self.build_post_request(&path)?;
        self.send(req).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "client", op = "mark_all_as_read"))]
    async fn mark_all_as_read(&self) -> Result<()> {
        let req = self.build_post_request(defaults::MARK_ALL_READ_PATH)?;
        self.send(req).await?;
        Ok(())
    }

    fn has_token(&self) -> bool {
        self.tokens.token().is_some()
    }
}
