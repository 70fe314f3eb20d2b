use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, StatusCode};

use super::http_trait::HttpClient;
use crate::error::{Error, Result};

/// Async HTTP client implementation using reqwest.
///
/// ```ignore
/// use backend_sp_indexer::{ReqwestClient, SpIndexerBackend};
///
/// let http_client = ReqwestClient::new()?;
/// let backend = SpIndexerBackend::new("https://indexer.example", http_client)?;
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new reqwest HTTP client with a 30 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| Error::HttpGet(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, query_params: &[(&str, String)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(query_params)
            .send()
            .await
            .map_err(|e| Error::HttpGet(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            // only the delay-seconds form of Retry-After is supported
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(Error::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| Error::ResponseBody(e.to_string()))
    }
}
