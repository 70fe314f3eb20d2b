use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_INTER_BLOCK_DELAY, DEFAULT_MAX_BLOCKS,
    DEFAULT_MAX_RATE_LIMIT_RETRIES, DEFAULT_RATE_LIMIT_BACKOFF,
};

/// Tuning knobs for the scan coordinator.
///
/// Durations are (de)serialized as milliseconds so the config can live in a
/// plain JSON file next to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanConfig {
    /// Number of blocks a backward scan covers when the caller gives no bound.
    pub max_blocks: u32,
    /// Pause between two successful block fetches.
    #[serde(with = "millis")]
    pub inter_block_delay: Duration,
    /// Pause before retrying a block the indexer rate limited.
    #[serde(with = "millis")]
    pub rate_limit_backoff: Duration,
    /// Retries allowed per block after a rate limit response.
    pub max_rate_limit_retries: u32,
    /// Upper bound on a single block fetch.
    #[serde(with = "millis")]
    pub fetch_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_blocks: DEFAULT_MAX_BLOCKS,
            inter_block_delay: DEFAULT_INTER_BLOCK_DELAY,
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
            max_rate_limit_retries: DEFAULT_MAX_RATE_LIMIT_RETRIES,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl ScanConfig {
    /// No delays at all, used when replaying against a local indexer.
    pub fn without_delays() -> Self {
        Self {
            inter_block_delay: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
            ..Default::default()
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
