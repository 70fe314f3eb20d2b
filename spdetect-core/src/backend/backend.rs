use async_trait::async_trait;
use bitcoin::BlockHash;

use crate::{
    error::Result,
    backend::{IndexerTransaction, SilentBlock},
};

/// Read access to a silent payment indexer.
///
/// Implementations report a rate limit response as
/// [`Error::RateLimited`](crate::Error::RateLimited) so the scanner can back off
/// and retry the same block; every other failure is treated as a failed fetch.
#[async_trait]
pub trait IndexerBackend: Send + Sync {
    /// Check that the indexer is up.
    async fn health(&self) -> Result<()>;

    /// Height of the indexer tip.
    async fn latest_height(&self) -> Result<u32>;

    /// All transactions with silent payment data in the block at `height`.
    async fn transactions_at_height(&self, height: u32) -> Result<Vec<IndexerTransaction>>;

    /// All transactions with silent payment data in the block `hash`.
    async fn transactions_for_hash(&self, hash: BlockHash) -> Result<Vec<IndexerTransaction>>;

    /// Tweak summary of the block at `height`.
    async fn silent_block_at_height(&self, height: u32) -> Result<SilentBlock>;

    /// Tweak summary of the block `hash`.
    async fn silent_block_for_hash(&self, hash: BlockHash) -> Result<SilentBlock>;
}
