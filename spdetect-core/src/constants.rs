use std::time::Duration;

/// BIP-352 purpose field of the derivation path.
pub const SP_PURPOSE: u32 = 352;
/// Only one account is ever derived.
pub const SP_ACCOUNT: u32 = 0;
/// Hardened branch holding the spend key: `m/352'/coin'/0'/0'/0`.
pub const SPEND_BRANCH: u32 = 0;
/// Hardened branch holding the scan key: `m/352'/coin'/0'/1'/0`.
pub const SCAN_BRANCH: u32 = 1;
/// Non-hardened leaf index below both branches.
pub const KEY_LEAF: u32 = 0;

/// Silent payment address version.
pub const SP_VERSION: u32 = 0;
/// Label reserved for change outputs.
pub const CHANGE_LABEL: u32 = 0;

/// BIP-32 master seed bounds.
pub const MIN_SEED_LEN: usize = 16;
pub const MAX_SEED_LEN: usize = 64;

pub const SCAN_TWEAK_LEN: usize = 33;
pub const OUTPUT_KEY_LEN: usize = 32;

pub const DEFAULT_MAX_BLOCKS: u32 = 100;
pub const DEFAULT_INTER_BLOCK_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 3;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);
