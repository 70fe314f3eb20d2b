use std::time::Duration;

use bitcoin::OutPoint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Key derivation
    #[error("invalid seed length {0}, expected 16 to 64 bytes")]
    InvalidSeedLength(usize),
    #[error("failed to generate master key from seed")]
    SeedDerivation,
    #[error("failed to derive {0} key")]
    KeyDerivation(&'static str),
    #[error(transparent)]
    Mnemonic(#[from] bip39::Error),

    // Validation
    #[error("invalid scan range: start ({0}) > end ({1})")]
    InvalidRange(u32, u32),
    #[error("scan tweak must be 33 bytes, got {0}")]
    InvalidTweakLength(usize),
    #[error("output key must be 32 bytes, got {0}")]
    InvalidOutputKeyLength(usize),
    #[error("malformed tweak for output {0}")]
    InvalidTweak(OutPoint),

    // Indexer
    #[error("indexer rate limit reached")]
    RateLimited { retry_after: Option<Duration> },
    #[error("indexer did not answer within {0:?}")]
    Timeout(Duration),

    // Wrapped external errors
    #[error(transparent)]
    SilentPayments(#[from] silentpayments::Error),
    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),
    #[error(transparent)]
    Bip32(#[from] bitcoin::bip32::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    // Backend pass-through for downstream crates
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether the indexer asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
