//! Datadog v1 REST client.
//!
//! The controller only sees [`ResourceApi`]: a relative path goes in, parsed
//! JSON comes out, and any non-2xx status is a [`RetagError::Http`]. There
//! is no retry, backoff or rate-limit handling.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::errors::{Result, RetagError};

pub const DEFAULT_SITE: &str = "datadoghq.com";
pub const EU_SITE: &str = "datadoghq.eu";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "DD-API-KEY";
const APP_KEY_HEADER: &str = "DD-APPLICATION-KEY";

/// Request/response seam over the platform API.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// `GET <base>/<path>`
    async fn get(&self, path: &str) -> Result<Value>;

    /// `PUT <base>/<path>` with `body` as JSON
    async fn put(&self, path: &str, body: &Value) -> Result<Value>;
}

/// API and application key pair.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    app_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, app_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let app_key = app_key.into();
        if api_key.trim().is_empty() || app_key.trim().is_empty() {
            return Err(RetagError::config(
                "Datadog API and APP keys are required (DD_API_KEY, DD_APP_KEY)",
            ));
        }
        Ok(Self { api_key, app_key })
    }

    /// Reads `DD_API_KEY` and `DD_APP_KEY` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Self::new(
            lookup("DD_API_KEY").unwrap_or_default(),
            lookup("DD_APP_KEY").unwrap_or_default(),
        )
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("app_key", &"<redacted>")
            .finish()
    }
}

/// Builds the v1 API base URL for a Datadog site (e.g. `datadoghq.eu`).
pub fn site_base_url(site: &str) -> Result<Url> {
    parse_base_url(&format!("https://api.{}/api/v1/", site.trim().trim_matches('/')))
}

/// Parses an explicit base URL, forcing a trailing slash so relative paths
/// join underneath it.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized)
        .map_err(|e| RetagError::config_with_source(format!("invalid API base URL `{raw}`"), e))
}

#[derive(Debug, Clone)]
pub struct DatadogClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl DatadogClient {
    pub fn new(credentials: Credentials, base_url: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("retag/{}", crate::VERSION))
            .build()
            .map_err(|e| RetagError::config_with_source("failed to build HTTP client", e))?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RetagError::config_with_source(format!("invalid API path `{path}`"), e))
    }

    async fn send(
        &self,
        method: &'static str,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value> {
        let response = request
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .header(APP_KEY_HEADER, &self.credentials.app_key)
            .send()
            .await
            .map_err(|e| RetagError::transport_with_source(format!("{method} {path} failed"), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetagError::Http {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::trace!(method, path, status = status.as_u16(), "api call succeeded");

        response.json::<Value>().await.map_err(|e| {
            RetagError::transport_with_source(format!("{method} {path}: response is not JSON"), e)
        })
    }
}

#[async_trait]
impl ResourceApi for DatadogClient {
    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.url(path)?;
        self.send("GET", path, self.http.get(url)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path)?;
        self.send("PUT", path, self.http.put(url).json(body)).await
    }
}
