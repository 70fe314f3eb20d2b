//! Silent payment wallet keys.
//!
//! This module provides [`KeyDerivation`], which turns a seed (or a BIP-39
//! mnemonic) into the scan and spend keypairs of a silent payment wallet and
//! the matching `sp1...` address.
//!
//! Keys are derived under the BIP-352 purpose root:
//!
//! - spend: `m/352'/coin'/0'/0'/0`
//! - scan: `m/352'/coin'/0'/1'/0`
//!
//! where `coin` is `0` on mainnet and `1` on every test network.

mod keys;

pub use keys::KeyDerivation;
