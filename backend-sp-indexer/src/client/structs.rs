//! Wire format of the indexer responses.

use bitcoin::{secp256k1::PublicKey, Amount, BlockHash, Txid};
use serde::Deserialize;
use spdetect_core::{IndexerOutput, IndexerTransaction, SilentBlock};

use crate::error::{Error, Result};

/// The tip height, either a bare number or `{ "height": n }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LatestHeightResponse {
    Bare(u32),
    Wrapped { height: u32 },
}

impl LatestHeightResponse {
    pub fn height(&self) -> u32 {
        match self {
            LatestHeightResponse::Bare(height) => *height,
            LatestHeightResponse::Wrapped { height } => *height,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilentBlockResponse {
    pub block_height: u32,
    pub block_hash: BlockHash,
    pub tweaks: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: Txid,
    pub block_height: u32,
    pub block_hash: BlockHash,
    /// Kept as text so one bad transaction does not fail the whole block.
    #[serde(default)]
    pub scan_tweak: Option<String>,
    #[serde(default)]
    pub outputs: Vec<OutputResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputResponse {
    #[serde(default)]
    pub pub_key: Option<String>,
    pub vout: u32,
    pub value: u64,
    #[serde(default)]
    pub is_spent: bool,
}

impl TryFrom<SilentBlockResponse> for SilentBlock {
    type Error = Error;

    fn try_from(value: SilentBlockResponse) -> Result<Self> {
        let tweaks = value
            .tweaks
            .iter()
            .map(|tweak| {
                let bytes = hex::decode(tweak).map_err(|e| Error::InvalidData(e.to_string()))?;
                PublicKey::from_slice(&bytes).map_err(|e| Error::InvalidData(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SilentBlock {
            block_height: value.block_height,
            block_hash: value.block_hash,
            tweaks,
        })
    }
}

impl From<OutputResponse> for IndexerOutput {
    fn from(value: OutputResponse) -> Self {
        IndexerOutput {
            vout: value.vout,
            pub_key: decode_or_empty(value.pub_key.as_deref()),
            value: Amount::from_sat(value.value),
            is_spent: value.is_spent,
        }
    }
}

impl From<TransactionResponse> for IndexerTransaction {
    fn from(value: TransactionResponse) -> Self {
        IndexerTransaction {
            txid: value.id,
            block_height: value.block_height,
            block_hash: value.block_hash,
            scan_tweak: decode_or_empty(value.scan_tweak.as_deref()),
            outputs: value.outputs.into_iter().map(Into::into).collect(),
        }
    }
}

/// Missing or undecodable hex becomes an empty buffer, which the scanner
/// treats as "nothing to scan" for that transaction or output.
fn decode_or_empty(field: Option<&str>) -> Vec<u8> {
    match field.map(hex::decode) {
        Some(Ok(bytes)) => bytes,
        Some(Err(e)) => {
            log::debug!("dropping malformed hex field: {}", e);
            vec![]
        }
        None => vec![],
    }
}
