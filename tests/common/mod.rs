//! Shared utilities for integration testing.

#![allow(dead_code)]

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, Log, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use chest_relay::blockchain::{
    BlockchainError, BlockchainResult, ChainBackend, ChainReceipt, GasPolicy, OperatorSigner, TxSubmitter,
};
use chest_relay::config::ListenerConfig;
use chest_relay::gateway::ContractAddresses;
use chest_relay::{Gateway, RelayServer, Shutdown};

/// Anvil's first account.
pub const OPERATOR_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const CHAIN_ID: u64 = 31337;
pub const ESTIMATED_GAS: u64 = 123_456;
pub const NETWORK_GAS_PRICE: u128 = 2_000_000_000;

pub fn operator() -> Address {
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
}

pub fn contracts() -> ContractAddresses {
    ContractAddresses {
        chest: Address::repeat_byte(0xc1),
        lobby: Address::repeat_byte(0x1b),
        game: Address::repeat_byte(0x6a),
    }
}

type Responder = Box<dyn Fn(&[u8]) -> BlockchainResult<Vec<u8>> + Send + Sync>;

/// One `eth_call` the gateway made.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub to: Option<Address>,
    pub input: Bytes,
}

/// In-memory chain. View calls are answered by per-selector responders;
/// broadcasts are recorded and mined immediately.
#[derive(Default)]
pub struct MockChain {
    responders: Mutex<HashMap<[u8; 4], Responder>>,
    calls: Mutex<Vec<RecordedCall>>,
    sent: Mutex<Vec<Bytes>>,
    estimates: AtomicU64,
    nonce_lookups: AtomicU64,
    estimate_error: Mutex<Option<String>>,
    receipt_logs: Mutex<Vec<Log>>,
    receipt_failed: Mutex<bool>,
    call_delay: Mutex<Option<Duration>>,
    broadcast_delay: Mutex<Option<Duration>>,
    balances: Mutex<HashMap<Address, U256>>,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer calls to `selector` with `f(calldata)`.
    pub fn respond<F>(&self, selector: [u8; 4], f: F)
    where
        F: Fn(&[u8]) -> BlockchainResult<Vec<u8>> + Send + Sync + 'static,
    {
        self.responders.lock().unwrap().insert(selector, Box::new(f));
    }

    /// Answer calls to `selector` with fixed return data.
    pub fn respond_with(&self, selector: [u8; 4], output: Vec<u8>) {
        self.respond(selector, move |_| Ok(output.clone()));
    }

    pub fn fail_estimate(&self, reason: &str) {
        *self.estimate_error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn emit_logs(&self, logs: Vec<Log>) {
        *self.receipt_logs.lock().unwrap() = logs;
    }

    pub fn revert_on_chain(&self) {
        *self.receipt_failed.lock().unwrap() = true;
    }

    pub fn slow_calls(&self, delay: Duration) {
        *self.call_delay.lock().unwrap() = Some(delay);
    }

    /// Delay nonce lookups and broadcasts, widening the window in which
    /// unserialized writers would reuse a nonce.
    pub fn slow_broadcasts(&self, delay: Duration) {
        *self.broadcast_delay.lock().unwrap() = Some(delay);
    }

    async fn broadcast_pause(&self) {
        let delay = *self.broadcast_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.balances.lock().unwrap().insert(address, balance);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().unwrap().clone()
    }

    /// Decoded signed transactions, in broadcast order.
    pub fn sent_transactions(&self) -> Vec<TxEnvelope> {
        self.sent()
            .iter()
            .map(|raw| TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap())
            .collect()
    }

    pub fn estimate_count(&self) -> u64 {
        self.estimates.load(Ordering::SeqCst)
    }

    pub fn nonce_lookups(&self) -> u64 {
        self.nonce_lookups.load(Ordering::SeqCst)
    }

    /// Total chain traffic of any kind.
    pub fn network_calls(&self) -> usize {
        self.calls().len() + self.sent().len() + self.estimate_count() as usize + self.nonce_lookups() as usize
    }
}

#[async_trait]
impl ChainBackend for MockChain {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        Ok(CHAIN_ID)
    }

    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        let input = tx.input.input().cloned().unwrap_or_default();
        let to = tx.to.and_then(|kind| kind.to().copied());
        self.calls.lock().unwrap().push(RecordedCall {
            to,
            input: input.clone(),
        });

        let delay = *self.call_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| BlockchainError::Rpc("calldata too short".into()))?;
        let responders = self.responders.lock().unwrap();
        let responder = responders
            .get(&selector)
            .ok_or_else(|| BlockchainError::Reverted(format!("no responder for {:?}", selector)))?;
        responder(&input).map(Bytes::from)
    }

    async fn estimate_gas(&self, _tx: TransactionRequest) -> BlockchainResult<u64> {
        self.estimates.fetch_add(1, Ordering::SeqCst);
        match self.estimate_error.lock().unwrap().clone() {
            Some(reason) => Err(BlockchainError::Reverted(reason)),
            None => Ok(ESTIMATED_GAS),
        }
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        Ok(NETWORK_GAS_PRICE)
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    /// Like a node's pending count: the number of transactions broadcast so far.
    async fn pending_nonce(&self, _address: Address) -> BlockchainResult<u64> {
        self.nonce_lookups.fetch_add(1, Ordering::SeqCst);
        let nonce = self.sent.lock().unwrap().len() as u64;
        self.broadcast_pause().await;
        Ok(nonce)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash> {
        self.broadcast_pause().await;
        let hash = keccak256(&raw);
        self.sent.lock().unwrap().push(raw);
        Ok(hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<ChainReceipt>> {
        let raw = self
            .sent()
            .into_iter()
            .find(|raw| keccak256(raw) == tx_hash);
        let Some(raw) = raw else {
            return Ok(None);
        };
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
            .map_err(|e| BlockchainError::Rpc(e.to_string()))?;

        Ok(Some(ChainReceipt {
            transaction_hash: tx_hash,
            transaction_index: Some(0),
            block_hash: Some(keccak256(tx_hash)),
            block_number: Some(19_000_000),
            from: operator(),
            to: envelope.to(),
            gas_used: 51_234,
            cumulative_gas_used: 51_234,
            effective_gas_price: NETWORK_GAS_PRICE,
            status: !*self.receipt_failed.lock().unwrap(),
            logs: self.receipt_logs.lock().unwrap().clone(),
        }))
    }
}

/// Gas policy with fast receipt polling.
pub fn fast_policy() -> GasPolicy {
    GasPolicy {
        gas_price_multiplier: 1.5,
        max_gas_price_gwei: 100,
        confirmation_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    }
}

/// Submitter over `chain`, signing as the Anvil operator.
pub fn submitter(chain: Arc<MockChain>) -> TxSubmitter {
    let signer = Arc::new(OperatorSigner::from_private_key(OPERATOR_KEY, CHAIN_ID).unwrap());
    TxSubmitter::new(chain, signer, fast_policy())
}

/// Gateway over `chain`, signing as the Anvil operator.
pub fn gateway(chain: Arc<MockChain>) -> Gateway {
    let submitter = submitter(Arc::clone(&chain));
    Gateway::new(chain, Some(submitter), contracts())
}

/// Gateway with no operator key.
pub fn read_only_gateway(chain: Arc<MockChain>) -> Gateway {
    Gateway::new(chain, None, contracts())
}

/// A relay listening on an ephemeral port.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestRelay {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_relay(gateway: Gateway) -> TestRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = RelayServer::new(gateway, &ListenerConfig::default(), CHAIN_ID, shutdown.clone());
    let handle = tokio::spawn(server.run(listener));
    TestRelay { addr, shutdown, handle }
}

/// Gas price the submitter should sign with under [`fast_policy`].
pub fn expected_gas_price() -> u128 {
    (NETWORK_GAS_PRICE as f64 * fast_policy().gas_price_multiplier) as u128
}

/// Signed transactions must carry these fields regardless of the event.
pub fn assert_signed_by_policy(tx: &TxEnvelope) {
    assert_eq!(tx.gas_limit(), ESTIMATED_GAS);
    assert_eq!(tx.gas_price(), Some(expected_gas_price()));
    assert_eq!(tx.chain_id(), Some(CHAIN_ID));
}
