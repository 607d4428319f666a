//! HTTP client with status handling and redirect resolution.

use crate::error::{MetaError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::config::HttpConfig;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Follows a link through its redirects to the final location
#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<Url>;
}

/// Shared HTTP client
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// HTTP client
    client: Client,
}

impl HttpClient {
    /// Create a new client
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Create a client from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::new(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }

    /// GET a page body, failing on any non-success status
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Making request");

        let start = Url::parse(url)?;
        let response = self.client.get(start).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(url = %url, status = %status, "Request failed");
            return Err(MetaError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(url = %url, bytes = body.len(), "Request successful");
        Ok(body)
    }

    /// GET and decode a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET without judging the status; callers decide what a miss looks like
    pub async fn get_lenient(&self, url: &str) -> Result<(StatusCode, String)> {
        debug!(url = %url, "Making lenient request");

        let start = Url::parse(url)?;
        let response = self.client.get(start).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(url = %url, status = %status, "Lenient request complete");
        Ok((status, body))
    }

    /// POST a JSON payload and decode the JSON response
    pub async fn post_json<B, T>(&self, url: &str, payload: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(url = %url, "Making POST request");

        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(url = %url, status = %status, "POST request failed");
            return Err(MetaError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl LinkResolver for HttpClient {
    async fn resolve(&self, url: &str) -> Result<Url> {
        let start = Url::parse(url)?;
        let response = self.client.get(start).send().await?;
        let resolved = response.url().clone();
        debug!(from = %url, to = %resolved, "Resolved link");
        Ok(resolved)
    }
}
