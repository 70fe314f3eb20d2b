use bitcoin::BlockHash;
use spdetect_core::{IndexerTransaction, SilentBlock};
use url::Url;

use crate::error::Result;

use super::http_trait::HttpClient;
use super::structs::{LatestHeightResponse, SilentBlockResponse, TransactionsResponse};

/// Client for the indexer HTTP API.
///
/// Generic over the HTTP client implementation, allowing consumers to provide
/// their own HTTP client by implementing the `HttpClient` trait.
#[derive(Clone)]
pub struct IndexerClient<H: HttpClient> {
    http_client: H,
    host_url: Url,
}

impl<H: HttpClient> IndexerClient<H> {
    pub fn new(host_url: &str, http_client: H) -> Result<Self> {
        let mut host_url = Url::parse(host_url)?;

        // we need a trailing slash, if not present we append it
        if !host_url.path().ends_with('/') {
            host_url.set_path(&format!("{}/", host_url.path()));
        }

        Ok(IndexerClient {
            http_client,
            host_url,
        })
    }

    pub fn host_url(&self) -> &Url {
        &self.host_url
    }

    pub async fn health(&self) -> Result<()> {
        let url = self.host_url.join("health")?;
        self.http_client.get(url.as_str(), &[]).await?;
        Ok(())
    }

    pub async fn latest_height(&self) -> Result<u32> {
        let url = self.host_url.join("silent-block/latest-height")?;
        let body = self.http_client.get(url.as_str(), &[]).await?;
        let latest: LatestHeightResponse = serde_json::from_str(&body)?;
        Ok(latest.height())
    }

    pub async fn silent_block_at_height(&self, height: u32) -> Result<SilentBlock> {
        let url = self
            .host_url
            .join(&format!("silent-block/height/{}", height))?;
        self.silent_block(url).await
    }

    pub async fn silent_block_for_hash(&self, hash: BlockHash) -> Result<SilentBlock> {
        let url = self.host_url.join(&format!("silent-block/hash/{}", hash))?;
        self.silent_block(url).await
    }

    pub async fn transactions_at_height(&self, height: u32) -> Result<Vec<IndexerTransaction>> {
        let url = self
            .host_url
            .join(&format!("transactions/height/{}", height))?;
        self.transactions(url).await
    }

    pub async fn transactions_for_hash(&self, hash: BlockHash) -> Result<Vec<IndexerTransaction>> {
        let url = self.host_url.join(&format!("transactions/hash/{}", hash))?;
        self.transactions(url).await
    }

    async fn silent_block(&self, url: Url) -> Result<SilentBlock> {
        let body = self.http_client.get(url.as_str(), &[]).await?;
        let block: SilentBlockResponse = serde_json::from_str(&body)?;
        block.try_into()
    }

    async fn transactions(&self, url: Url) -> Result<Vec<IndexerTransaction>> {
        let body = self.http_client.get(url.as_str(), &[]).await?;
        let res: TransactionsResponse = serde_json::from_str(&body)?;
        log::debug!("{} returned {} transactions", url, res.transactions.len());
        Ok(res.transactions.into_iter().map(Into::into).collect())
    }
}
