//! HTTP client and configuration.

mod auth;
mod http;

pub use auth::AuthInfo;
pub use http::{HttpConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

use crate::api::{AccountApi, ActivityApi, ChatApi};
use crate::error::{Error, Result};
use http::{build_client, HttpExecutor};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating GoodPointsClient.
pub struct GoodPointsClientBuilder {
    auth: Option<AuthInfo>,
    http_config: HttpConfig,
}

impl std::fmt::Debug for GoodPointsClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoodPointsClientBuilder")
            .field("authenticated", &self.auth.is_some())
            .field("http_config", &self.http_config)
            .finish()
    }
}

impl Default for GoodPointsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GoodPointsClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            auth: None,
            http_config: HttpConfig::default(),
        }
    }

    /// Set the bearer token.
    pub fn auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthInfo::new(token));
        self
    }

    /// Set authentication from AuthInfo.
    pub fn with_auth(mut self, auth: AuthInfo) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.http_config.base_url = url.into();
        self
    }

    /// Set custom user agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.http_config.user_agent = ua.into();
        self
    }

    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.connect_timeout = timeout;
        self
    }

    /// Set read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.read_timeout = timeout;
        self
    }

    /// Build GoodPointsClient.
    pub fn build(self) -> Result<GoodPointsClient> {
        // Fail on a bad base URL here rather than on the first request.
        self.http_config.resolve_url("")?;
        let http_client = build_client(&self.http_config)?;

        Ok(GoodPointsClient {
            inner: Arc::new(GoodPointsClientInner {
                http: http_client,
                config: self.http_config,
                auth: self.auth,
            }),
        })
    }
}

/// Internal client state.
pub(crate) struct GoodPointsClientInner {
    pub http: reqwest::Client,
    pub config: HttpConfig,
    pub auth: Option<AuthInfo>,
}

impl GoodPointsClientInner {
    /// Get auth info or error.
    pub fn require_auth(&self) -> Result<&AuthInfo> {
        self.auth.as_ref().ok_or(Error::AuthRequired)
    }

    /// Create an authenticated HTTP executor.
    pub fn executor(&self) -> Result<HttpExecutor<'_>> {
        let auth = self.require_auth()?;
        Ok(HttpExecutor::new(
            &self.http,
            &self.config,
            Some(auth.token.as_str()),
        ))
    }

    /// Execute an authenticated GET request.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        api: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.executor()?.get_json(api, query).await
    }

    /// Execute an authenticated JSON POST request.
    pub async fn post_json<B, T>(&self, api: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.executor()?.post_json(api, body).await
    }

    /// Execute an authenticated POST request whose answer is not needed.
    pub async fn post_ignored<B: Serialize + ?Sized>(&self, api: &str, body: &B) -> Result<()> {
        self.executor()?.post(api, body).await.map(|_| ())
    }
}

/// Good Points client: entry point to every HTTP boundary.
#[derive(Clone)]
pub struct GoodPointsClient {
    pub(crate) inner: Arc<GoodPointsClientInner>,
}

impl GoodPointsClient {
    /// Create a new client builder.
    pub fn builder() -> GoodPointsClientBuilder {
        GoodPointsClientBuilder::new()
    }

    /// Get the chat API.
    pub fn chat(&self) -> ChatApi {
        ChatApi::new(self.inner.clone())
    }

    /// Get the activity feed API.
    pub fn activity(&self) -> ActivityApi {
        ActivityApi::new(self.inner.clone())
    }

    /// Get the account API.
    pub fn account(&self) -> AccountApi {
        AccountApi::new(self.inner.clone())
    }

    /// Check if the client is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.inner.auth.is_some()
    }

    /// Get the current authentication info.
    pub fn auth_info(&self) -> Option<&AuthInfo> {
        self.inner.auth.as_ref()
    }

    pub fn config(&self) -> &HttpConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for GoodPointsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoodPointsClient")
            .field("authenticated", &self.is_authenticated())
            .field("base_url", &self.inner.config.base_url)
            .finish()
    }
}
