//! HTTP client configuration and request execution.

use crate::error::{Error, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

/// Default Good Points API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/";

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("goodpoints-rs/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL for API requests.
    pub base_url: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Read timeout.
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpConfig {
    /// Resolve a relative API path to a full URL.
    ///
    /// The base is treated as a directory even without a trailing slash.
    pub fn resolve_url(&self, api: &str) -> Result<Url> {
        if api.starts_with("http://") || api.starts_with("https://") {
            return Url::parse(api).map_err(Error::Url);
        }

        let base = if self.base_url.ends_with('/') {
            Url::parse(&self.base_url)
        } else {
            Url::parse(&format!("{}/", self.base_url))
        };

        base.and_then(|b| b.join(api.trim_start_matches('/')))
            .map_err(Error::Url)
    }
}

/// Build a reqwest client with the given configuration.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .gzip(true)
        .build()
        .map_err(Error::Network)
}

/// HTTP request executor.
pub struct HttpExecutor<'a> {
    client: &'a Client,
    config: &'a HttpConfig,
    token: Option<&'a str>,
}

impl<'a> HttpExecutor<'a> {
    /// Create a new executor.
    pub fn new(client: &'a Client, config: &'a HttpConfig, token: Option<&'a str>) -> Self {
        Self {
            client,
            config,
            token,
        }
    }

    /// Build a request with common headers.
    fn build_request(&self, method: Method, api: &str) -> Result<RequestBuilder> {
        let url = self.config.resolve_url(api)?;
        let mut request = self
            .client
            .request(method, url)
            .header(header::USER_AGENT, &self.config.user_agent)
            .header(header::ACCEPT, "application/json");

        if let Some(token) = self.token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    /// Execute a GET request and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        api: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        log::debug!("GET {api} {query:?}");
        let response = self
            .build_request(Method::GET, api)?
            .query(query)
            .send()
            .await
            .map_err(Error::Network)?;

        let text = self.handle_response(response).await?;
        parse_json_response(&text)
    }

    /// Execute a POST request with a JSON body and return the raw response text.
    pub async fn post<B: Serialize + ?Sized>(&self, api: &str, body: &B) -> Result<String> {
        log::debug!("POST {api}");
        let response = self
            .build_request(Method::POST, api)?
            .json(body)
            .send()
            .await
            .map_err(Error::Network)?;

        self.handle_response(response).await
    }

    /// Execute a POST request with a JSON body and decode the JSON answer.
    pub async fn post_json<B, T>(&self, api: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.post(api, body).await?;
        parse_json_response(&text)
    }

    /// Map non-success statuses to [`Error::Api`].
    async fn handle_response(&self, response: Response) -> Result<String> {
        let status = response.status();
        let text = response.text().await.map_err(Error::Network)?;

        if !status.is_success() {
            let message = api_error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_owned());
            return Err(Error::api(status.as_u16(), message));
        }

        Ok(text)
    }
}

/// Pull a human-readable message out of an error body.
fn api_error_message(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(|m| m.as_str())
            .map(str::to_owned),
        Err(_) => Some(trimmed.to_owned()),
    }
}

/// Parse a JSON response body.
fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T> {
    if text.trim().is_empty() {
        return Err(Error::EmptyResponse);
    }
    serde_json::from_str(text).map_err(Error::Json)
}
