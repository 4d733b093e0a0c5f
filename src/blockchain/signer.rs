//! Operator account and transaction signing.
//!
//! # Security
//! - The private key is loaded ONLY from the environment
//! - Keys are never logged or serialized; `Debug` prints the address only
//! - The raw hex is held in a zeroizing buffer while parsing; the parsed
//!   key relies on the underlying k256 `SigningKey` wiping itself on drop
//!
//! # Write serialization
//! All writes from the operator share one account nonce sequence. The
//! signer owns a write lock that the submitter holds from nonce selection
//! until the node has accepted the signed transaction.

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use tokio::sync::{Mutex, MutexGuard};
use zeroize::Zeroizing;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Environment variable name for the operator private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "RELAY_OPERATOR_PRIVATE_KEY";

/// The single account that signs every outbound write.
pub struct OperatorSigner {
    wallet: EthereumWallet,
    address: Address,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
    write_lock: Mutex<()>,
}

impl OperatorSigner {
    /// Create a signer from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for transaction signing
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> BlockchainResult<Self> {
        let key_hex = Zeroizing::new(
            private_key_hex
                .trim()
                .trim_start_matches("0x")
                .to_string(),
        );

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;
        let address = signer.address();

        tracing::info!(
            address = %address,
            chain_id = chain_id,
            "Operator signer initialized"
        );

        Ok(Self {
            wallet: EthereumWallet::from(signer),
            address,
            chain_id,
            write_lock: Mutex::new(()),
        })
    }

    /// Load the signer from `RELAY_OPERATOR_PRIVATE_KEY`.
    ///
    /// An unset or empty variable yields `Ok(None)`: the relay still serves
    /// reads and reports writes as unconfigured. A malformed key is an error.
    pub fn from_env(chain_id: u64) -> BlockchainResult<Option<Self>> {
        let Some(private_key) = std::env::var(PRIVATE_KEY_ENV_VAR).ok().map(Zeroizing::new) else {
            return Ok(None);
        };
        if private_key.trim().is_empty() {
            return Ok(None);
        }

        Self::from_private_key(&private_key, chain_id).map(Some)
    }

    /// Get the operator's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the chain ID this signer is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Acquire the per-account write lock.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Sign a fully populated transaction request and return its
    /// EIP-2718 encoding, ready for `eth_sendRawTransaction`.
    pub async fn sign(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        let envelope = tx
            .build(&self.wallet)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Signing failed: {}", e)))?;
        Ok(envelope.encoded_2718().into())
    }
}

impl std::fmt::Debug for OperatorSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorSigner")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}
