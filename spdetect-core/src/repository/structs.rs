use bitcoin::{Amount, BlockHash, OutPoint, Txid, XOnlyPublicKey};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An output paid to this wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilentPaymentUtxo {
    pub txid: Txid,
    pub vout: u32,
    pub value: Amount,
    pub pub_key: XOnlyPublicKey,
    pub block_height: u32,
    pub block_hash: BlockHash,
    /// Scalar added to the spend key to obtain the output key, needed to spend.
    pub tweak: [u8; 32],
    pub is_spent: bool,
}

impl SilentPaymentUtxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid,
            vout: self.vout,
        }
    }
}

/// Persisted form of a [`SilentPaymentUtxo`], with the tweak as hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableUtxo {
    pub txid: Txid,
    pub vout: u32,
    pub value: u64,
    pub pub_key: XOnlyPublicKey,
    pub block_height: u32,
    pub block_hash: BlockHash,
    pub is_spent: bool,
    pub tweak_hex: String,
}

impl From<&SilentPaymentUtxo> for SerializableUtxo {
    fn from(utxo: &SilentPaymentUtxo) -> Self {
        Self {
            txid: utxo.txid,
            vout: utxo.vout,
            value: utxo.value.to_sat(),
            pub_key: utxo.pub_key,
            block_height: utxo.block_height,
            block_hash: utxo.block_hash,
            is_spent: utxo.is_spent,
            tweak_hex: hex::encode(utxo.tweak),
        }
    }
}

impl TryFrom<SerializableUtxo> for SilentPaymentUtxo {
    type Error = Error;

    fn try_from(record: SerializableUtxo) -> Result<Self, Self::Error> {
        let mut tweak = [0u8; 32];
        hex::decode_to_slice(&record.tweak_hex, &mut tweak).map_err(|_| {
            Error::InvalidTweak(OutPoint {
                txid: record.txid,
                vout: record.vout,
            })
        })?;

        Ok(Self {
            txid: record.txid,
            vout: record.vout,
            value: Amount::from_sat(record.value),
            pub_key: record.pub_key,
            block_height: record.block_height,
            block_hash: record.block_hash,
            tweak,
            is_spent: record.is_spent,
        })
    }
}
