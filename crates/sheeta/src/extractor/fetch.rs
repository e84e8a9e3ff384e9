use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::debug;

use super::error::FetchError;

/// Query parameters in send order. Keys may repeat.
pub type Query = Vec<(String, String)>;

/// The single HTTP capability the resolver and handles depend on: GET a URL
/// and parse the body as JSON.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn fetch_json(
        &self,
        url: &str,
        headers: &HeaderMap,
        query: &[(String, String)],
    ) -> Result<Value, FetchError>;
}

/// [`JsonFetcher`] over a shared `reqwest::Client`. Timeouts are whatever the
/// client was built with.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl JsonFetcher for ReqwestFetcher {
    async fn fetch_json(
        &self,
        url: &str,
        headers: &HeaderMap,
        query: &[(String, String)],
    ) -> Result<Value, FetchError> {
        debug!(url, ?query, "GET");
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
