//! Mock collaborators and a scripted command for unit tests

use crate::command::{Command, CommandReceipt, ResolvedInputs};
use crate::context::ExecutionContext;
use crate::error::ExecutionError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wallet_types::{
    AccountState, Address, ChainAddress, ChainError, ChainTransport, Collaborators,
    CryptoEngine, CryptoError, Intent, KeyPairs, StealthDerivation, Transaction, TxReceipt,
};

pub fn chain_address(n: u8) -> ChainAddress {
    ChainAddress::from_bytes([n; 20])
}

pub fn custody_address(n: u8) -> Address {
    Address::custody(chain_address(n).to_string())
}

pub fn smart_account_address(n: u8, custody: &Address) -> Address {
    Address::smart_account(chain_address(n).to_string(), custody.clone())
}

pub fn stealth_address() -> Address {
    Address::stealth(format!("st:0x{}", "ab".repeat(66)))
}

// ── Mock Transport ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTransport {
    states: Mutex<HashMap<ChainAddress, AccountState>>,
    broadcasts: Mutex<Vec<Transaction>>,
    queries: AtomicUsize,
    failing_queries: AtomicUsize,
}

impl MockTransport {
    /// Mark the address (and a smart account's companion) as deployed
    pub fn deploy(&self, address: &Address) {
        let custody = address.companion().map(|companion| {
            self.deploy(companion);
            parse(companion)
        });
        self.set_state(
            parse(address),
            AccountState {
                deployed: true,
                custody,
                ..AccountState::default()
            },
        );
    }

    pub fn set_balance(&self, address: &Address, balance: u128) {
        let mut states = self.states.lock().unwrap();
        states.entry(parse(address)).or_default().balance = balance;
    }

    pub fn set_state(&self, address: ChainAddress, state: AccountState) {
        self.states.lock().unwrap().insert(address, state);
    }

    /// The next `n` state queries fail with a transient error
    pub fn fail_next_queries(&self, n: usize) {
        self.failing_queries.store(n, Ordering::SeqCst);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn broadcasts(&self) -> Vec<Transaction> {
        self.broadcasts.lock().unwrap().clone()
    }
}

fn parse(address: &Address) -> ChainAddress {
    address.raw_reference().parse().unwrap()
}

#[async_trait]
impl ChainTransport for MockTransport {
    async fn broadcast(&self, transaction: &Transaction) -> Result<TxReceipt, ChainError> {
        let mut broadcasts = self.broadcasts.lock().unwrap();
        broadcasts.push(transaction.clone());
        Ok(TxReceipt {
            tx_hash: format!("0x{:064x}", broadcasts.len()),
            block_number: Some(broadcasts.len() as u64),
            gas_used: Some(21_000),
        })
    }

    async fn query_state(&self, address: &ChainAddress) -> Result<AccountState, ChainError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_queries.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_queries.store(remaining - 1, Ordering::SeqCst);
            return Err(ChainError::Unavailable("connection reset".into()));
        }
        Ok(self
            .states
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }
}

// ── Mock Crypto ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockCrypto {
    pub derivations: AtomicUsize,
}

#[async_trait]
impl CryptoEngine for MockCrypto {
    async fn derive_key_pairs(&self) -> Result<KeyPairs, CryptoError> {
        Ok(KeyPairs {
            spending_public_key: "02ee".into(),
            viewing_public_key: "03ee".into(),
            key_ref: "ephemeral".into(),
        })
    }

    async fn derive_stealth_address(
        &self,
        _meta_address: &str,
        ephemeral: &KeyPairs,
    ) -> Result<StealthDerivation, CryptoError> {
        let n = self.derivations.fetch_add(1, Ordering::SeqCst) as u8;
        Ok(StealthDerivation {
            address: chain_address(0xa0 + n),
            ephemeral_public_key: ephemeral.spending_public_key.clone(),
            view_tag: n,
        })
    }
}

pub fn collaborators() -> (Arc<MockTransport>, Arc<MockCrypto>, Collaborators) {
    let transport = Arc::new(MockTransport::default());
    let crypto = Arc::new(MockCrypto::default());
    let collaborators = Collaborators::new(transport.clone(), crypto.clone());
    (transport, crypto, collaborators)
}

// ── Scripted Command ─────────────────────────────────────────────────

/// Command whose result, delay and dependencies are fixed by the test
#[derive(Clone, Debug)]
pub struct ScriptedCommand {
    name: String,
    address: Address,
    dependencies: Vec<Address>,
    fails: bool,
    delay: Option<Duration>,
    executions: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedCommand {
    pub fn succeeding(name: &str, address: Address) -> Self {
        Self {
            name: name.to_string(),
            address,
            dependencies: Vec::new(),
            fails: false,
            delay: None,
            executions: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(name: &str, address: Address) -> Self {
        Self {
            fails: true,
            ..Self::succeeding(name, address)
        }
    }

    /// Same script and shared counters under another name
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_dependency(mut self, address: Address) -> Self {
        self.dependencies.push(address);
        self
    }

    pub fn executions(&self) -> Arc<AtomicUsize> {
        self.executions.clone()
    }

    /// Highest number of executions observed running at once
    pub fn in_flight_peak(&self) -> Arc<AtomicUsize> {
        self.peak.clone()
    }
}

#[async_trait]
impl Command for ScriptedCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> &Address {
        &self.address
    }

    fn intent(&self) -> Option<&Intent> {
        None
    }

    fn dependencies(&self) -> Vec<Address> {
        self.dependencies.clone()
    }

    async fn execute(
        &self,
        _ctx: &ExecutionContext,
        inputs: &ResolvedInputs,
    ) -> Result<CommandReceipt, ExecutionError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fails {
            Err(ExecutionError::Precondition(format!("{} scripted to fail", self.name)))
        } else {
            Ok(CommandReceipt::new(self.name.clone(), inputs.address.address))
        }
    }
}
