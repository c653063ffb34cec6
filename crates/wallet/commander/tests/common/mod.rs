//! Shared fixtures: in-memory chain and crypto collaborators, and a command
//! whose behaviour is scripted by the test.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;
use wallet_commander::{
    Command, CommandReceipt, ExecutionContext, ExecutionError, ResolvedInputs,
};
use wallet_types::{
    AccountState, Address, ChainAddress, ChainError, ChainTransport, Collaborators,
    CryptoEngine, CryptoError, Intent, KeyPairs, StealthDerivation, Transaction, TxReceipt,
};

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

pub fn chain_address(n: u8) -> ChainAddress {
    ChainAddress::from_bytes([n; 20])
}

pub fn custody(n: u8) -> Address {
    Address::custody(chain_address(n).to_string())
}

pub fn smart_account(n: u8, custody: &Address) -> Address {
    Address::smart_account(chain_address(n).to_string(), custody.clone())
}

pub fn stealth_meta_address() -> String {
    format!("st:0x{}", "cd".repeat(66))
}

// ---------------------------------------------------------------------------
// In-memory chain
// ---------------------------------------------------------------------------

/// Chain transport backed by a map of account states.
///
/// Every address is deployed unless marked otherwise, so tests only have to
/// describe the exceptions.
#[derive(Default)]
pub struct InMemoryChain {
    states: Mutex<HashMap<ChainAddress, AccountState>>,
    undeployed: Mutex<Vec<ChainAddress>>,
    broadcasts: Mutex<Vec<Transaction>>,
    query_delay: Mutex<Option<Duration>>,
    queries: AtomicUsize,
}

impl InMemoryChain {
    pub fn bind(&self, smart_account: &Address) {
        let companion = smart_account
            .companion()
            .map(|c| c.raw_reference().parse().unwrap());
        let key = smart_account.raw_reference().parse().unwrap();
        self.states.lock().unwrap().entry(key).or_default().custody = companion;
    }

    pub fn set_balance(&self, address: &Address, balance: u128) {
        let key = address.raw_reference().parse().unwrap();
        self.states.lock().unwrap().entry(key).or_default().balance = balance;
    }

    pub fn undeploy(&self, address: &Address) {
        let key = address.raw_reference().parse().unwrap();
        self.undeployed.lock().unwrap().push(key);
    }

    pub fn slow_queries(&self, delay: Duration) {
        *self.query_delay.lock().unwrap() = Some(delay);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn broadcasts(&self) -> Vec<Transaction> {
        self.broadcasts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainTransport for InMemoryChain {
    async fn broadcast(&self, transaction: &Transaction) -> Result<TxReceipt, ChainError> {
        let mut broadcasts = self.broadcasts.lock().unwrap();
        broadcasts.push(transaction.clone());
        Ok(TxReceipt {
            tx_hash: format!("0x{:064x}", broadcasts.len()),
            block_number: Some(100 + broadcasts.len() as u64),
            gas_used: Some(50_000),
        })
    }

    async fn query_state(&self, address: &ChainAddress) -> Result<AccountState, ChainError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let delay = *self.query_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self
            .states
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default();
        state.deployed = !self.undeployed.lock().unwrap().contains(address);
        Ok(state)
    }
}

// ---------------------------------------------------------------------------
// Crypto engine
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingCrypto {
    derivations: AtomicUsize,
}

impl CountingCrypto {
    pub fn derivations(&self) -> usize {
        self.derivations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CryptoEngine for CountingCrypto {
    async fn derive_key_pairs(&self) -> Result<KeyPairs, CryptoError> {
        Ok(KeyPairs {
            spending_public_key: "02f0".into(),
            viewing_public_key: "03f0".into(),
            key_ref: "ephemeral".into(),
        })
    }

    async fn derive_stealth_address(
        &self,
        _meta_address: &str,
        ephemeral: &KeyPairs,
    ) -> Result<StealthDerivation, CryptoError> {
        let n = self.derivations.fetch_add(1, Ordering::SeqCst) as u8;
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(StealthDerivation {
            address: chain_address(0xe0 + n),
            ephemeral_public_key: ephemeral.spending_public_key.clone(),
            view_tag: n,
        })
    }
}

pub struct Harness {
    pub chain: Arc<InMemoryChain>,
    pub crypto: Arc<CountingCrypto>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            chain: Arc::new(InMemoryChain::default()),
            crypto: Arc::new(CountingCrypto::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(self.chain.clone(), self.crypto.clone())
    }

    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(self.collaborators())
    }
}

// ---------------------------------------------------------------------------
// Scripted command
// ---------------------------------------------------------------------------

/// Ordered record of command starts and finishes across a run
pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

pub fn execution_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[derive(Debug)]
pub struct ScriptedCommand {
    name: String,
    address: Address,
    dependencies: Vec<Address>,
    fails: bool,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
    log: ExecutionLog,
}

impl ScriptedCommand {
    pub fn ok(name: &str, log: &ExecutionLog) -> Self {
        Self {
            name: name.to_string(),
            address: custody(1),
            dependencies: Vec::new(),
            fails: false,
            delay: None,
            barrier: None,
            log: log.clone(),
        }
    }

    pub fn failing(name: &str, log: &ExecutionLog) -> Self {
        Self {
            fails: true,
            ..Self::ok(name, log)
        }
    }

    pub fn bound_to(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn depending_on(mut self, address: Address) -> Self {
        self.dependencies.push(address);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wait at `barrier` before finishing; only passes if enough siblings
    /// run at the same time
    pub fn meeting(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
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
        self.log.lock().unwrap().push(format!("start:{}", self.name));
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.log.lock().unwrap().push(format!("end:{}", self.name));

        if self.fails {
            Err(ExecutionError::Precondition(format!("{} failed", self.name)))
        } else {
            Ok(CommandReceipt::new(self.name.clone(), inputs.address.address))
        }
    }
}

pub fn logged(log: &ExecutionLog) -> Vec<String> {
    log.lock().unwrap().clone()
}
