use std::fmt;

use bitcoin::{
    bip32::{self, ChildNumber},
    secp256k1::{All, PublicKey, Secp256k1, SecretKey},
    Network,
};
use silentpayments::{
    receiving::{Label, Receiver},
    Network as SpNetwork, SilentPaymentAddress,
};
use zeroize::Zeroizing;

use crate::{
    constants::{
        CHANGE_LABEL, KEY_LEAF, MAX_SEED_LEN, MIN_SEED_LEN, SCAN_BRANCH, SPEND_BRANCH,
        SP_ACCOUNT, SP_PURPOSE, SP_VERSION,
    },
    error::{Error, Result},
};

/// Scan and spend keypairs of a silent payment wallet.
struct KeyMaterial {
    scan_sk: SecretKey,
    scan_pk: PublicKey,
    spend_sk: SecretKey,
    spend_pk: PublicKey,
}

impl KeyMaterial {
    fn scrub(&mut self) {
        self.scan_sk.non_secure_erase();
        self.spend_sk.non_secure_erase();
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.scrub();
    }
}

enum KeyState {
    Uninitialized,
    Derived(KeyMaterial),
}

/// Derives the wallet keys and silent payment address from a seed.
///
/// Derivation happens on first use and is memoised until [`KeyDerivation::clear`]
/// is called. The seed itself is kept (zeroized on drop) so cleared keys can be
/// derived again.
pub struct KeyDerivation {
    seed: Zeroizing<Vec<u8>>,
    network: Network,
    state: KeyState,
    address: Option<String>,
    secp: Secp256k1<All>,
}

impl fmt::Debug for KeyDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDerivation")
            .field("network", &self.network)
            .field("derived", &matches!(self.state, KeyState::Derived(_)))
            .finish_non_exhaustive()
    }
}

impl KeyDerivation {
    pub fn new(seed: &[u8], network: Network) -> Result<Self> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(Error::InvalidSeedLength(seed.len()));
        }

        Ok(Self {
            seed: Zeroizing::new(seed.to_vec()),
            network,
            state: KeyState::Uninitialized,
            address: None,
            secp: Secp256k1::new(),
        })
    }

    pub fn from_mnemonic(phrase: &str, network: Network) -> Result<Self> {
        Self::from_mnemonic_with_passphrase(phrase, "", network)
    }

    pub fn from_mnemonic_with_passphrase(
        phrase: &str,
        passphrase: &str,
        network: Network,
    ) -> Result<Self> {
        let mnemonic = bip39::Mnemonic::parse(phrase)?;
        let seed = Zeroizing::new(mnemonic.to_seed(passphrase));
        Self::new(seed.as_slice(), network)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn get_scan_private_key(&mut self) -> Result<SecretKey> {
        Ok(self.keys()?.scan_sk)
    }

    pub fn get_spend_private_key(&mut self) -> Result<SecretKey> {
        Ok(self.keys()?.spend_sk)
    }

    pub fn get_scan_public_key(&mut self) -> Result<PublicKey> {
        Ok(self.keys()?.scan_pk)
    }

    pub fn get_spend_public_key(&mut self) -> Result<PublicKey> {
        Ok(self.keys()?.spend_pk)
    }

    pub fn get_silent_payment_address(&mut self) -> Result<String> {
        if let Some(address) = &self.address {
            return Ok(address.clone());
        }

        let address = self.receiving_address()?.to_string();
        self.address = Some(address.clone());
        Ok(address)
    }

    pub fn receiving_address(&mut self) -> Result<SilentPaymentAddress> {
        Ok(self.receiver()?.get_receiving_address())
    }

    /// Build the receiver used to recognise outputs paid to this wallet.
    pub fn receiver(&mut self) -> Result<Receiver> {
        let sp_network = sp_network(self.network);
        let keys = self.keys()?;
        let change_label = Label::new(keys.scan_sk, CHANGE_LABEL);

        Ok(Receiver::new(
            SP_VERSION,
            keys.scan_pk,
            keys.spend_pk,
            change_label,
            sp_network,
        )?)
    }

    /// Forget the derived keys and address. They are derived again on next use.
    pub fn clear(&mut self) {
        if let KeyState::Derived(mut keys) =
            std::mem::replace(&mut self.state, KeyState::Uninitialized)
        {
            keys.scrub();
        }
        self.address = None;
    }

    fn keys(&mut self) -> Result<&KeyMaterial> {
        if let KeyState::Uninitialized = self.state {
            log::debug!("deriving silent payment keys for {}", self.network);
            let keys = derive_key_material(&self.secp, &self.seed, self.network)?;
            self.state = KeyState::Derived(keys);
        }

        match &self.state {
            KeyState::Derived(keys) => Ok(keys),
            KeyState::Uninitialized => Err(Error::SeedDerivation),
        }
    }
}

fn sp_network(network: Network) -> SpNetwork {
    match network {
        Network::Bitcoin => SpNetwork::Mainnet,
        Network::Regtest => SpNetwork::Regtest,
        _ => SpNetwork::Testnet,
    }
}

fn derive_key_material(
    secp: &Secp256k1<All>,
    seed: &[u8],
    network: Network,
) -> Result<KeyMaterial> {
    let master_xpriv =
        bip32::Xpriv::new_master(network, seed).map_err(|_| Error::SeedDerivation)?;
    let coin_type = match network {
        Network::Bitcoin => 0u32,
        _ => 1,
    };
    let base_deriv = vec![
        ChildNumber::from_hardened_idx(SP_PURPOSE)?,
        ChildNumber::from_hardened_idx(coin_type)?,
        ChildNumber::from_hardened_idx(SP_ACCOUNT)?,
    ];

    let mut scan_deriv = base_deriv.clone();
    scan_deriv.push(ChildNumber::from_hardened_idx(SCAN_BRANCH)?);
    scan_deriv.push(ChildNumber::from_normal_idx(KEY_LEAF)?);

    let mut spend_deriv = base_deriv;
    spend_deriv.push(ChildNumber::from_hardened_idx(SPEND_BRANCH)?);
    spend_deriv.push(ChildNumber::from_normal_idx(KEY_LEAF)?);

    let scan_sk = master_xpriv
        .derive_priv(secp, &scan_deriv)
        .map_err(|_| Error::KeyDerivation("scan"))?
        .private_key;

    let spend_sk = master_xpriv
        .derive_priv(secp, &spend_deriv)
        .map_err(|_| Error::KeyDerivation("spend"))?
        .private_key;

    Ok(KeyMaterial {
        scan_pk: scan_sk.public_key(secp),
        scan_sk,
        spend_pk: spend_sk.public_key(secp),
        spend_sk,
    })
}
