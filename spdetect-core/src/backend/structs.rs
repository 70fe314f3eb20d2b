use bitcoin::{secp256k1::PublicKey, Amount, BlockHash, Txid};

/// A candidate output as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerOutput {
    pub vout: u32,
    /// x-only output key, expected to be 32 bytes
    pub pub_key: Vec<u8>,
    pub value: Amount,
    pub is_spent: bool,
}

/// One transaction of a block together with its scan tweak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerTransaction {
    pub txid: Txid,
    pub block_height: u32,
    pub block_hash: BlockHash,
    /// compressed tweak point, expected to be 33 bytes
    pub scan_tweak: Vec<u8>,
    pub outputs: Vec<IndexerOutput>,
}

impl IndexerTransaction {
    /// Only transactions with a tweak and at least one output can pay us.
    pub fn is_scannable(&self) -> bool {
        !self.scan_tweak.is_empty() && !self.outputs.is_empty()
    }
}

/// Block-level summary of all the tweaks of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilentBlock {
    pub block_height: u32,
    pub block_hash: BlockHash,
    pub tweaks: Vec<PublicKey>,
}
