//! Silent payment (BIP-352) detection for light clients.
//!
//! Keys are derived from a seed, blocks are pulled from an indexer through an
//! [`IndexerBackend`] and the outputs paying the wallet end up in a
//! [`UtxoRepository`].

pub mod account;
mod backend;
mod client;
pub mod config;
pub mod constants;
pub mod error;
mod repository;
mod scanner;

#[cfg(test)]
pub(crate) mod testing;

pub use bitcoin;
pub use silentpayments;

pub use account::{PersistedState, SilentPaymentScanning, SpAccount};
pub use backend::*;
pub use client::*;
pub use config::ScanConfig;
pub use error::{Error, Result};
pub use repository::*;
pub use scanner::*;
