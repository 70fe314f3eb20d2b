use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use bitcoin::{Amount, Network};
use serde::{Deserialize, Serialize};

use crate::{
    backend::IndexerBackend,
    client::KeyDerivation,
    config::ScanConfig,
    error::Result,
    repository::{SerializableUtxo, SilentPaymentUtxo, UtxoRepository},
    scanner::{ScanCoordinator, ScanDirection, ScanReport},
};

/// What a wallet needs from a silent payment account.
#[async_trait]
pub trait SilentPaymentScanning {
    fn sp_address(&mut self) -> Result<String>;

    /// Catch up from the indexer tip, `max_blocks` deep (config default if `None`).
    async fn scan_backward(&self, max_blocks: Option<u32>) -> Result<ScanReport>;

    /// Scan from `from_height` up to `to_height`, or to the tip.
    async fn scan_forward(&self, from_height: u32, to_height: Option<u32>) -> Result<ScanReport>;

    fn balance(&self) -> Amount;

    fn utxos(&self) -> Vec<SilentPaymentUtxo>;

    fn scan_height(&self) -> u32;

    fn stop(&self);
}

/// Snapshot of an account, enough to resume scanning after a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub scan_height: u32,
    pub utxos: Vec<SerializableUtxo>,
}

impl PersistedState {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub struct SpAccount<B: IndexerBackend> {
    keys: KeyDerivation,
    repository: Arc<UtxoRepository>,
    scanner: ScanCoordinator<B>,
    stop: Arc<AtomicBool>,
}

impl<B: IndexerBackend> SpAccount<B> {
    pub fn new(
        backend: B,
        mut keys: KeyDerivation,
        config: ScanConfig,
        stop: Arc<AtomicBool>,
    ) -> Result<Self> {
        let repository = Arc::new(UtxoRepository::new());
        let scanner = ScanCoordinator::new(backend, &mut keys, repository.clone(), config)?
            .with_stop_flag(stop.clone());

        Ok(Self {
            keys,
            repository,
            scanner,
            stop,
        })
    }

    /// Rebuild an account from a [`PersistedState`], scanning resumes after its height.
    pub fn from_persisted(
        backend: B,
        keys: KeyDerivation,
        config: ScanConfig,
        stop: Arc<AtomicBool>,
        state: PersistedState,
    ) -> Result<Self> {
        let mut account = Self::new(backend, keys, config, stop)?;
        account.repository.load_from_serializable(state.utxos)?;
        account.scanner = account.scanner.with_scan_progress(state.scan_height);
        Ok(account)
    }

    pub fn network(&self) -> Network {
        self.keys.network()
    }

    pub fn repository(&self) -> &Arc<UtxoRepository> {
        &self.repository
    }

    pub fn scanner(&self) -> &ScanCoordinator<B> {
        &self.scanner
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            scan_height: self.scanner.scan_progress(),
            utxos: self.repository.get_serializable(),
        }
    }

    #[cfg(test)]
    fn should_interrupt(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<B: IndexerBackend> SilentPaymentScanning for SpAccount<B> {
    fn sp_address(&mut self) -> Result<String> {
        self.keys.get_silent_payment_address()
    }

    async fn scan_backward(&self, max_blocks: Option<u32>) -> Result<ScanReport> {
        self.scanner
            .scan(ScanDirection::Backward {
                from_height: None,
                max_blocks,
            })
            .await
    }

    async fn scan_forward(&self, from_height: u32, to_height: Option<u32>) -> Result<ScanReport> {
        self.scanner
            .scan(ScanDirection::Forward {
                from_height,
                to_height,
            })
            .await
    }

    fn balance(&self) -> Amount {
        self.repository.get_balance()
    }

    fn utxos(&self) -> Vec<SilentPaymentUtxo> {
        self.repository.get_all()
    }

    fn scan_height(&self) -> u32 {
        self.scanner.scan_progress()
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::secp256k1::SecretKey;

    use super::*;
    use crate::testing::{pay_to, test_keys, tx_paying, MockBackend, MNEMONIC};

    fn create_test_account(backend: MockBackend, stop: Arc<AtomicBool>) -> SpAccount<MockBackend> {
        SpAccount::new(backend, test_keys(), ScanConfig::without_delays(), stop).unwrap()
    }

    fn backend_with_payment(tip: u32, height: u32, value: u64) -> MockBackend {
        let mut keys = test_keys();
        let sender = SecretKey::from_slice(&[0x21; 32]).unwrap();
        let ours = pay_to(&mut keys, &sender, 0);
        MockBackend::new(tip).with_block(height, vec![tx_paying(&sender, height, vec![(ours, value)])])
    }

    #[test]
    fn test_stop_flag_initial_state() {
        let stop = Arc::new(AtomicBool::new(false));
        let account = create_test_account(MockBackend::new(100), stop.clone());

        // Initially should not be interrupted
        assert!(!account.should_interrupt());
        assert!(!account.scanner().should_interrupt());
    }

    #[test]
    fn test_stop_flag_after_external_set() {
        let stop = Arc::new(AtomicBool::new(false));
        let account = create_test_account(MockBackend::new(100), stop.clone());

        stop.store(true, Ordering::Relaxed);

        assert!(account.should_interrupt());
        assert!(account.scanner().should_interrupt());
    }

    #[test]
    fn test_stop_method_sets_flag() {
        let stop = Arc::new(AtomicBool::new(false));
        let account = create_test_account(MockBackend::new(100), stop.clone());

        account.stop();

        // Both the shared flag and should_interrupt should reflect the change
        assert!(stop.load(Ordering::Relaxed));
        assert!(account.should_interrupt());
    }

    #[test]
    fn test_shared_stop_flag_across_accounts() {
        let shared_stop = Arc::new(AtomicBool::new(false));

        let account1 = create_test_account(MockBackend::new(100), shared_stop.clone());
        assert!(!account1.should_interrupt());

        shared_stop.store(true, Ordering::Relaxed);
        assert!(account1.should_interrupt());

        // a new account built on the same flag sees the stop right away
        let account2 = create_test_account(MockBackend::new(100), shared_stop.clone());
        assert!(account2.should_interrupt());
    }

    #[tokio::test]
    async fn stopped_account_scans_nothing() {
        let stop = Arc::new(AtomicBool::new(true));
        let account = create_test_account(MockBackend::new(100), stop);

        let report = account.scan_backward(Some(10)).await.unwrap();

        assert!(report.interrupted);
        assert!(account.scanner().backend().visited().is_empty());
    }

    #[tokio::test]
    async fn scan_updates_balance_and_height() {
        let stop = Arc::new(AtomicBool::new(false));
        let account = create_test_account(backend_with_payment(118, 110, 50_000), stop);

        let report = account.scan_backward(Some(19)).await.unwrap();

        assert_eq!(report.new_utxos, 1);
        assert_eq!(account.balance(), Amount::from_sat(50_000));
        assert_eq!(account.utxos().len(), 1);
        assert_eq!(account.scan_height(), 118);
    }

    #[tokio::test]
    async fn persisted_state_restores_account() {
        let stop = Arc::new(AtomicBool::new(false));
        let account = create_test_account(backend_with_payment(60, 55, 12_345), stop.clone());
        account.scan_forward(50, None).await.unwrap();

        let json = account.persisted_state().to_json().unwrap();
        let state = PersistedState::from_json(&json).unwrap();
        assert_eq!(state.scan_height, 60);

        let restored = SpAccount::from_persisted(
            MockBackend::new(60),
            test_keys(),
            ScanConfig::without_delays(),
            stop,
            state,
        )
        .unwrap();

        assert_eq!(restored.balance(), Amount::from_sat(12_345));
        assert_eq!(restored.scan_height(), 60);
        assert_eq!(restored.utxos(), account.utxos());
    }

    #[test]
    fn persisted_state_field_names() {
        let json = PersistedState::default().to_json().unwrap();
        assert_eq!(json, r#"{"scanHeight":0,"utxos":[]}"#);
    }

    #[test]
    fn sp_address_matches_keys() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut account = create_test_account(MockBackend::new(1), stop);

        let mut keys = KeyDerivation::from_mnemonic(MNEMONIC, Network::Regtest).unwrap();
        let address = account.sp_address().unwrap();

        assert_eq!(address, keys.get_silent_payment_address().unwrap());
        assert!(address.starts_with("sprt1"));
        assert_eq!(account.network(), Network::Regtest);
    }
}
