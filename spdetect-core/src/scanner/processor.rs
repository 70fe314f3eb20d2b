use bitcoin::{
    secp256k1::{PublicKey, SecretKey},
    XOnlyPublicKey,
};
use silentpayments::{receiving::Receiver, utils as sp_utils};

use crate::{
    backend::{IndexerOutput, IndexerTransaction},
    client::KeyDerivation,
    constants::{OUTPUT_KEY_LEN, SCAN_TWEAK_LEN},
    error::{Error, Result},
    repository::SilentPaymentUtxo,
};

/// Recognises the outputs of a transaction that pay this wallet.
#[derive(Debug, Clone)]
pub struct TransactionProcessor {
    scan_sk: SecretKey,
    sp_receiver: Receiver,
}

impl TransactionProcessor {
    pub fn new(keys: &mut KeyDerivation) -> Result<Self> {
        Ok(Self {
            scan_sk: keys.get_scan_private_key()?,
            sp_receiver: keys.receiver()?,
        })
    }

    /// Outputs of `tx` that belong to us.
    ///
    /// A transaction with malformed silent payment data yields no outputs.
    pub fn process(&self, tx: &IndexerTransaction) -> Vec<SilentPaymentUtxo> {
        match self.find_owned_outputs(tx) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("skipping tx {} at {}: {}", tx.txid, tx.block_height, e);
                vec![]
            }
        }
    }

    /// Run [`TransactionProcessor::process`] over all the transactions of a block.
    ///
    /// Matches are returned in transaction order.
    pub fn process_block(&self, txs: &[&IndexerTransaction]) -> Vec<SilentPaymentUtxo> {
        // ECDH is the expensive part, spread transactions over the rayon pool
        #[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
        let found: Vec<Vec<SilentPaymentUtxo>> = {
            use rayon::prelude::*;
            txs.par_iter().map(|tx| self.process(tx)).collect()
        };

        // Sequential fallback (WASM or no parallel feature)
        #[cfg(not(all(not(target_arch = "wasm32"), feature = "parallel")))]
        let found: Vec<Vec<SilentPaymentUtxo>> = txs.iter().map(|tx| self.process(tx)).collect();

        found.into_iter().flatten().collect()
    }

    fn find_owned_outputs(&self, tx: &IndexerTransaction) -> Result<Vec<SilentPaymentUtxo>> {
        if tx.scan_tweak.len() != SCAN_TWEAK_LEN {
            return Err(Error::InvalidTweakLength(tx.scan_tweak.len()));
        }
        let tweak = PublicKey::from_slice(&tx.scan_tweak)?;

        let candidates: Vec<(&IndexerOutput, XOnlyPublicKey)> = tx
            .outputs
            .iter()
            .filter_map(|output| match parse_output_key(&output.pub_key) {
                Ok(xonly) => Some((output, xonly)),
                Err(e) => {
                    log::debug!("ignoring output {}:{}: {}", tx.txid, output.vout, e);
                    None
                }
            })
            .collect();

        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let shared_secret =
            sp_utils::receiving::calculate_ecdh_shared_secret(&tweak, &self.scan_sk);
        let output_keys = candidates.iter().map(|(_, xonly)| *xonly).collect();
        let ours = self
            .sp_receiver
            .scan_transaction(&shared_secret, output_keys)?;

        let mut res = vec![];
        for (output, xonly) in candidates {
            let tweak = ours.values().find_map(|map| map.get(&xonly));
            if let Some(tweak) = tweak {
                res.push(SilentPaymentUtxo {
                    txid: tx.txid,
                    vout: output.vout,
                    value: output.value,
                    pub_key: xonly,
                    block_height: tx.block_height,
                    block_hash: tx.block_hash,
                    tweak: tweak.to_be_bytes(),
                    is_spent: output.is_spent,
                });
            }
        }

        if !res.is_empty() {
            log::info!("found {} output(s) in tx {}", res.len(), tx.txid);
        }

        Ok(res)
    }
}

fn parse_output_key(bytes: &[u8]) -> Result<XOnlyPublicKey> {
    if bytes.len() != OUTPUT_KEY_LEN {
        return Err(Error::InvalidOutputKeyLength(bytes.len()));
    }
    Ok(XOnlyPublicKey::from_slice(bytes)?)
}
