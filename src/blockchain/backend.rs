//! The JSON-RPC surface the relay depends on.
//!
//! Everything the gateway needs from a node goes through [`ChainBackend`].
//! [`crate::blockchain::RpcClient`] implements it over alloy providers;
//! tests substitute an in-memory chain.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, ChainReceipt};

#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> BlockchainResult<u64>;

    /// `eth_call` against the latest block.
    async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes>;

    /// `eth_estimateGas`. A revert surfaces as [`BlockchainError::Reverted`]
    /// carrying the decoded reason when the node returned one.
    ///
    /// [`BlockchainError::Reverted`]: crate::blockchain::BlockchainError::Reverted
    async fn estimate_gas(&self, tx: TransactionRequest) -> BlockchainResult<u64>;

    /// `eth_gasPrice`, in wei.
    async fn gas_price(&self) -> BlockchainResult<u128>;

    /// `eth_getBalance` at the latest block.
    async fn balance(&self, address: Address) -> BlockchainResult<U256>;

    /// `eth_getTransactionCount` at the pending block.
    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64>;

    /// `eth_sendRawTransaction`. Returns once the node has accepted the
    /// transaction into its pool.
    async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash>;

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<ChainReceipt>>;
}
