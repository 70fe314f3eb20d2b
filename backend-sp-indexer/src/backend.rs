use std::time::Duration;

use async_trait::async_trait;
use bitcoin::BlockHash;
use serde::{Deserialize, Serialize};
use spdetect_core::{IndexerBackend, IndexerTransaction, SilentBlock};

use crate::client::{HttpClient, IndexerClient};
use crate::error::Result;

/// Where the indexer lives and how long a request may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl IndexerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// [`IndexerBackend`] backed by the indexer HTTP API, generic over the HTTP client.
///
/// Consumers can provide their own HTTP client by implementing the `HttpClient` trait,
/// or use [`SpIndexerBackend::from_config`] with the bundled reqwest client.
pub struct SpIndexerBackend<H: HttpClient> {
    client: IndexerClient<H>,
}

impl<H: HttpClient> SpIndexerBackend<H> {
    pub fn new(base_url: &str, http_client: H) -> Result<Self> {
        Ok(Self {
            client: IndexerClient::new(base_url, http_client)?,
        })
    }

    pub fn client(&self) -> &IndexerClient<H> {
        &self.client
    }
}

#[cfg(feature = "reqwest-client")]
impl SpIndexerBackend<crate::client::ReqwestClient> {
    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        let http_client = crate::client::ReqwestClient::with_timeout(config.timeout())?;
        Self::new(&config.base_url, http_client)
    }
}

#[async_trait]
impl<H: HttpClient> IndexerBackend for SpIndexerBackend<H> {
    async fn health(&self) -> spdetect_core::Result<()> {
        Ok(self.client.health().await?)
    }

    async fn latest_height(&self) -> spdetect_core::Result<u32> {
        Ok(self.client.latest_height().await?)
    }

    async fn transactions_at_height(
        &self,
        height: u32,
    ) -> spdetect_core::Result<Vec<IndexerTransaction>> {
        Ok(self.client.transactions_at_height(height).await?)
    }

    async fn transactions_for_hash(
        &self,
        hash: BlockHash,
    ) -> spdetect_core::Result<Vec<IndexerTransaction>> {
        Ok(self.client.transactions_for_hash(hash).await?)
    }

    async fn silent_block_at_height(&self, height: u32) -> spdetect_core::Result<SilentBlock> {
        Ok(self.client.silent_block_at_height(height).await?)
    }

    async fn silent_block_for_hash(&self, hash: BlockHash) -> spdetect_core::Result<SilentBlock> {
        Ok(self.client.silent_block_for_hash(hash).await?)
    }
}
