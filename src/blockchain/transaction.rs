//! Transaction building, signing, submission and confirmation.
//!
//! # Responsibilities
//! - Estimate gas (a failed estimate stops the write before signing)
//! - Apply the gas price policy
//! - Pick the nonce and broadcast under the operator's write lock
//! - Poll for the receipt until mined or the confirmation deadline passes
//!
//! Nothing here retries a write: a failure at any step is returned once.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::backend::ChainBackend;
use crate::blockchain::signer::OperatorSigner;
use crate::blockchain::types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainReceipt};
use crate::observability::metrics;

/// A state-changing call the operator should make.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Contract function name, for logs and metrics.
    pub function: &'static str,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl WriteRequest {
    pub fn new(function: &'static str, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            function,
            to,
            value: U256::ZERO,
            data: data.into(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Gas price limits and confirmation timing.
#[derive(Debug, Clone)]
pub struct GasPolicy {
    pub gas_price_multiplier: f64,
    pub max_gas_price_gwei: u64,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl From<&BlockchainConfig> for GasPolicy {
    fn from(config: &BlockchainConfig) -> Self {
        Self {
            gas_price_multiplier: config.gas_price_multiplier,
            max_gas_price_gwei: config.max_gas_price_gwei,
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Submits writes on behalf of the operator account.
#[derive(Clone)]
pub struct TxSubmitter {
    backend: Arc<dyn ChainBackend>,
    signer: Arc<OperatorSigner>,
    policy: GasPolicy,
}

impl TxSubmitter {
    /// Create a new transaction submitter.
    pub fn new(backend: Arc<dyn ChainBackend>, signer: Arc<OperatorSigner>, policy: GasPolicy) -> Self {
        Self {
            backend,
            signer,
            policy,
        }
    }

    /// Get the operator address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Estimate, sign, broadcast and wait for one write.
    ///
    /// A mined transaction whose status is failure is returned as
    /// [`BlockchainError::Reverted`].
    pub async fn submit(&self, request: WriteRequest) -> BlockchainResult<ChainReceipt> {
        let from = self.signer.address();
        let base = TransactionRequest::default()
            .with_from(from)
            .with_to(request.to)
            .with_value(request.value)
            .with_input(request.data.clone());

        let gas_limit = match self.backend.estimate_gas(base.clone()).await {
            Ok(gas) => gas,
            Err(e) => {
                tracing::warn!(function = request.function, error = %e, "Gas estimation failed");
                metrics::record_submission(request.function, "estimate_failed");
                return Err(BlockchainError::GasEstimation(match e {
                    BlockchainError::Reverted(reason) => reason,
                    other => other.to_string(),
                }));
            }
        };

        let gas_price = self.gas_price().await?;

        let tx_hash = {
            let _guard = self.signer.lock_writes().await;
            let nonce = self.backend.pending_nonce(from).await?;

            let tx = base
                .with_nonce(nonce)
                .with_gas_limit(gas_limit)
                .with_gas_price(gas_price)
                .with_chain_id(self.signer.chain_id());

            let raw = self.signer.sign(tx).await?;
            let tx_hash = self.backend.send_raw_transaction(raw).await.inspect_err(|e| {
                tracing::error!(function = request.function, error = %e, "Broadcast failed");
                metrics::record_submission(request.function, "broadcast_failed");
            })?;

            tracing::info!(
                function = request.function,
                tx_hash = %tx_hash,
                nonce = nonce,
                gas_limit = gas_limit,
                gas_price = gas_price,
                "Transaction submitted"
            );
            tx_hash
        };

        let receipt = self.wait_for_receipt(request.function, tx_hash).await?;
        if !receipt.status {
            metrics::record_submission(request.function, "reverted");
            return Err(BlockchainError::Reverted(format!(
                "transaction {} failed on-chain",
                tx_hash
            )));
        }

        metrics::record_submission(request.function, "confirmed");
        tracing::info!(
            function = request.function,
            tx_hash = %tx_hash,
            block_number = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(receipt)
    }

    /// Current network gas price with the multiplier applied, rejected if
    /// above the configured ceiling.
    async fn gas_price(&self) -> BlockchainResult<u128> {
        let network_price = self.backend.gas_price().await?;
        let adjusted = (network_price as f64 * self.policy.gas_price_multiplier) as u128;

        let adjusted_gwei = adjusted / 1_000_000_000;
        if adjusted_gwei > self.policy.max_gas_price_gwei as u128 {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: adjusted_gwei as u64,
                max_gwei: self.policy.max_gas_price_gwei,
            });
        }
        Ok(adjusted)
    }

    /// Poll for the receipt of a broadcast transaction.
    async fn wait_for_receipt(&self, function: &'static str, tx_hash: TxHash) -> BlockchainResult<ChainReceipt> {
        let result = timeout(self.policy.confirmation_timeout, async {
            let mut ticker = interval(self.policy.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match self.backend.transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
                    // The transaction is already out; keep polling rather
                    // than report a failure for something that may be mined.
                    Err(e) => tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed"),
                }
            }
        })
        .await;

        result.map_err(|_| {
            metrics::record_submission(function, "confirmation_timeout");
            BlockchainError::ConfirmationTimeout {
                tx_hash,
                secs: self.policy.confirmation_timeout.as_secs(),
            }
        })
    }
}
