//! Fixtures shared by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use bitcoin::{
    hashes::{sha256, Hash, HashEngine},
    secp256k1::{Scalar, Secp256k1, SecretKey},
    Amount, BlockHash, Network, Txid, XOnlyPublicKey,
};

use crate::{
    backend::{IndexerBackend, IndexerOutput, IndexerTransaction, SilentBlock},
    client::KeyDerivation,
    error::{Error, Result},
};

pub const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub fn test_keys() -> KeyDerivation {
    KeyDerivation::from_mnemonic(MNEMONIC, Network::Regtest).unwrap()
}

/// Output key of the `k`th payment from `sender` to the wallet behind `keys`.
///
/// `sender` plays the part of the summed input key already multiplied by the
/// input hash, the matching scan tweak is `sender·G`.
pub fn pay_to(keys: &mut KeyDerivation, sender: &SecretKey, k: u32) -> XOnlyPublicKey {
    let secp = Secp256k1::new();
    let scan_pk = keys.get_scan_public_key().unwrap();
    let spend_pk = keys.get_spend_public_key().unwrap();

    let ecdh = scan_pk.mul_tweak(&secp, &Scalar::from(*sender)).unwrap();

    let tag = sha256::Hash::hash(b"BIP0352/SharedSecret");
    let mut engine = sha256::Hash::engine();
    engine.input(tag.as_byte_array());
    engine.input(tag.as_byte_array());
    engine.input(&ecdh.serialize());
    engine.input(&k.to_be_bytes());
    let t_k = sha256::Hash::from_engine(engine).to_byte_array();

    spend_pk
        .add_exp_tweak(&secp, &Scalar::from_be_bytes(t_k).unwrap())
        .unwrap()
        .x_only_public_key()
        .0
}

/// Some valid x-only key nobody pays to.
pub fn random_output_key(seed: u8) -> XOnlyPublicKey {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
    sk.x_only_public_key(&secp).0
}

pub fn block_hash(height: u32) -> BlockHash {
    BlockHash::from_byte_array(sha256::Hash::hash(&height.to_be_bytes()).to_byte_array())
}

/// A transaction at `height` whose tweak comes from `sender`, with one output per entry.
pub fn tx_paying(
    sender: &SecretKey,
    height: u32,
    outputs: Vec<(XOnlyPublicKey, u64)>,
) -> IndexerTransaction {
    let secp = Secp256k1::new();

    let mut engine = sha256::Hash::engine();
    engine.input(&sender.secret_bytes());
    engine.input(&height.to_be_bytes());
    let txid = Txid::from_byte_array(sha256::Hash::from_engine(engine).to_byte_array());

    IndexerTransaction {
        txid,
        block_height: height,
        block_hash: block_hash(height),
        scan_tweak: sender.public_key(&secp).serialize().to_vec(),
        outputs: outputs
            .into_iter()
            .enumerate()
            .map(|(vout, (key, value))| IndexerOutput {
                vout: vout as u32,
                pub_key: key.serialize().to_vec(),
                value: Amount::from_sat(value),
                is_spent: false,
            })
            .collect(),
    }
}

/// In-memory indexer recording every block request it receives.
#[derive(Default)]
pub struct MockBackend {
    tip: u32,
    blocks: HashMap<u32, Vec<IndexerTransaction>>,
    rate_limits: Mutex<HashMap<u32, u32>>,
    retry_after: Option<Duration>,
    failing: HashSet<u32>,
    hanging: HashSet<u32>,
    visited: Mutex<Vec<u32>>,
}

impl MockBackend {
    pub fn new(tip: u32) -> Self {
        Self {
            tip,
            ..Default::default()
        }
    }

    pub fn with_block(mut self, height: u32, txs: Vec<IndexerTransaction>) -> Self {
        self.blocks.insert(height, txs);
        self
    }

    /// Answer the first `times` requests for `height` with a rate limit.
    pub fn rate_limited(self, height: u32, times: u32) -> Self {
        self.rate_limits.lock().unwrap().insert(height, times);
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn failing(mut self, height: u32) -> Self {
        self.failing.insert(height);
        self
    }

    /// Requests for `height` never complete.
    pub fn hanging(mut self, height: u32) -> Self {
        self.hanging.insert(height);
        self
    }

    /// Heights requested so far, in request order.
    pub fn visited(&self) -> Vec<u32> {
        self.visited.lock().unwrap().clone()
    }

    fn silent_block(&self, height: u32) -> SilentBlock {
        let tweaks = self
            .blocks
            .get(&height)
            .into_iter()
            .flatten()
            .filter_map(|tx| bitcoin::secp256k1::PublicKey::from_slice(&tx.scan_tweak).ok())
            .collect();

        SilentBlock {
            block_height: height,
            block_hash: block_hash(height),
            tweaks,
        }
    }

    fn take_rate_limit(&self, height: u32) -> bool {
        let mut rate_limits = self.rate_limits.lock().unwrap();
        match rate_limits.get_mut(&height) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn height_of(&self, hash: BlockHash) -> Option<u32> {
        (0..=self.tip).find(|height| block_hash(*height) == hash)
    }
}

#[async_trait]
impl IndexerBackend for MockBackend {
    async fn health(&self) -> Result<()> {
        Ok(())
    }

    async fn latest_height(&self) -> Result<u32> {
        Ok(self.tip)
    }

    async fn transactions_at_height(&self, height: u32) -> Result<Vec<IndexerTransaction>> {
        self.visited.lock().unwrap().push(height);

        if self.hanging.contains(&height) {
            std::future::pending::<()>().await;
        }

        if self.take_rate_limit(height) {
            return Err(Error::RateLimited {
                retry_after: self.retry_after,
            });
        }

        if self.failing.contains(&height) {
            return Err(Error::Backend("indexer unavailable".into()));
        }

        Ok(self.blocks.get(&height).cloned().unwrap_or_default())
    }

    async fn transactions_for_hash(&self, hash: BlockHash) -> Result<Vec<IndexerTransaction>> {
        match self.height_of(hash) {
            Some(height) => self.transactions_at_height(height).await,
            None => Err(Error::Backend(format!("unknown block {}", hash).into())),
        }
    }

    async fn silent_block_at_height(&self, height: u32) -> Result<SilentBlock> {
        Ok(self.silent_block(height))
    }

    async fn silent_block_for_hash(&self, hash: BlockHash) -> Result<SilentBlock> {
        match self.height_of(hash) {
            Some(height) => Ok(self.silent_block(height)),
            None => Err(Error::Backend(format!("unknown block {}", hash).into())),
        }
    }
}
