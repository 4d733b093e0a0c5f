//! Transaction submission gateway.
//!
//! # Data Flow
//! ```text
//! RelayRequest
//!     → mod.rs (dispatch, operator check, failure context)
//!     → reads.rs (eth_call, normalize)
//!     → writes.rs (validate, encode, submit, decode events)
//!         → fallback.rs (pick a sequence number for activate-fallback)
//!     → report.rs (one RelayResponse per event)
//! ```
//!
//! All writes are signed by the single operator account. When no operator
//! key was configured the read path still works and every write fails with
//! [`RelayError::NotConfigured`].

pub mod error;
mod fallback;
mod reads;
pub mod report;
mod writes;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::blockchain::normalize::Normalize;
use crate::blockchain::{ChainBackend, TxSubmitter};
use crate::config::ContractsConfig;
use crate::protocol::{Envelope, RelayRequest, RelayResponse};

pub use error::{RelayError, RelayResult};
pub use report::execute_and_report;

/// The three contracts the relay calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub chest: Address,
    pub lobby: Address,
    pub game: Address,
}

impl TryFrom<&ContractsConfig> for ContractAddresses {
    type Error = RelayError;

    fn try_from(config: &ContractsConfig) -> Result<Self, Self::Error> {
        let parse = |field: &str, value: &str| {
            value
                .trim()
                .parse::<Address>()
                .map_err(|_| RelayError::NotConfigured(format!("{} '{}' is not an address", field, value)))
        };
        Ok(Self {
            chest: parse("contracts.chest_address", &config.chest_address)?,
            lobby: parse("contracts.lobby_address", &config.lobby_address)?,
            game: parse("contracts.game_address", &config.game_address)?,
        })
    }
}

/// Executes client events against the chain.
#[derive(Clone)]
pub struct Gateway {
    chain: Arc<dyn ChainBackend>,
    submitter: Option<TxSubmitter>,
    contracts: ContractAddresses,
    /// Value sent with `requestChestOpening`; `None` reads `getEntropyFee()`.
    chest_opening_value: Option<U256>,
}

impl Gateway {
    pub fn new(chain: Arc<dyn ChainBackend>, submitter: Option<TxSubmitter>, contracts: ContractAddresses) -> Self {
        Self {
            chain,
            submitter,
            contracts,
            chest_opening_value: None,
        }
    }

    /// Use a fixed payable value for chest openings.
    pub fn with_chest_opening_value(mut self, value: Option<U256>) -> Self {
        self.chest_opening_value = value;
        self
    }

    /// Build a gateway from the contracts section of the configuration.
    pub fn from_config(
        chain: Arc<dyn ChainBackend>,
        submitter: Option<TxSubmitter>,
        config: &ContractsConfig,
    ) -> RelayResult<Self> {
        let contracts = ContractAddresses::try_from(config)?;
        let value = config
            .chest_opening_value()
            .map_err(|e| RelayError::NotConfigured(format!("contracts.chest_opening_value_wei {}", e)))?;
        Ok(Self::new(chain, submitter, contracts).with_chest_opening_value(value))
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    /// The operator address, when a signing key is configured.
    pub fn operator(&self) -> Option<Address> {
        self.submitter.as_ref().map(TxSubmitter::address)
    }

    /// Answer one text frame.
    pub async fn respond(&self, text: &str) -> RelayResponse {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(error = %e, "Malformed frame");
                return RelayResponse::malformed(e);
            }
        };

        let event = envelope.event.clone();
        let id = envelope.id.clone();
        let raw_context = self.raw_failure_context(&event, &envelope.data);
        match envelope.into_request() {
            Ok(request) => {
                if request.is_write() {
                    tracing::info!(event = %event, operator = ?self.operator(), "Write event accepted");
                }
                let context = self.failure_context(&request);
                execute_and_report(&event, id, context, self.execute(request)).await
            }
            Err(e) => execute_and_report(&event, id, raw_context, async { Err(e) }).await,
        }
    }

    /// Run a decoded request and return its success payload.
    pub async fn execute(&self, request: RelayRequest) -> RelayResult<Value> {
        match request {
            RelayRequest::TestConnection {} => Ok(self.test_connection()),
            RelayRequest::GetUserCoins { user_address } => self.get_user_coins(user_address).await,
            RelayRequest::GetRequestStatus { sequence_number } => self.get_request_status(sequence_number).await,
            RelayRequest::GetUserChestRequests { user_address } => {
                self.get_user_chest_requests(user_address).await
            }
            RelayRequest::GetEntropyFee {} => self.get_entropy_fee().await,
            RelayRequest::CanActivateFallback { sequence_number } => {
                self.can_activate_fallback(sequence_number).await
            }
            RelayRequest::GetLobbyPlayers {} => self.get_lobby_players().await,
            RelayRequest::GetUsername { user_address } => self.get_username(user_address).await,
            RelayRequest::GetRequiredEth {} => self.get_required_eth().await,
            RelayRequest::CheckStakeAmount { eth_amount } => self.check_stake_amount(&eth_amount).await,
            RelayRequest::CheckHasStaked { user_address } => self.check_has_staked(user_address).await,
            RelayRequest::CheckInLobby { user_address } => self.check_in_lobby(user_address).await,
            RelayRequest::GetTotalStaked {} => self.get_total_staked().await,
            RelayRequest::RewardsDistributed {} => self.rewards_distributed().await,
            RelayRequest::GetEthBalance { address } => self.get_eth_balance(address).await,
            RelayRequest::RequestChestOpening {} => self.request_chest_opening().await,
            RelayRequest::ActivateFallback { sequence_number } => self.activate_fallback(sequence_number).await,
            RelayRequest::SetUsername { username } => self.set_username(username).await,
            RelayRequest::DistributeRewards { leaderboard } => self.distribute_rewards(leaderboard).await,
            RelayRequest::SendKillData { killer, victim } => self.send_kill_data(killer, victim).await,
            RelayRequest::GenerateRandomNumber {} => self.generate_random_number().await,
            RelayRequest::GenerateGameLeaderboard { players } => self.generate_game_leaderboard(players).await,
        }
    }

    /// Fields echoed back when `request` fails.
    pub fn failure_context(&self, request: &RelayRequest) -> Map<String, Value> {
        let operator = self.operator().normalize();
        let context = match request {
            RelayRequest::ActivateFallback { sequence_number } => json!({
                "sequenceNumber": sequence_number.normalize(),
                "userAddress": operator,
            }),
            RelayRequest::SetUsername { username } => json!({
                "username": username,
                "userAddress": operator,
            }),
            RelayRequest::DistributeRewards { leaderboard } => json!({
                "leaderboard": leaderboard.normalize(),
            }),
            _ => return Map::new(),
        };
        match context {
            Value::Object(fields) => fields,
            _ => Map::new(),
        }
    }

    /// Failure fields for a frame whose arguments did not decode, echoed as
    /// the client sent them.
    fn raw_failure_context(&self, event: &str, data: &Value) -> Map<String, Value> {
        let arg = |name: &str| data.get(name).cloned().unwrap_or(Value::Null);
        let mut context = Map::new();
        match event {
            "activate-fallback" => {
                context.insert("sequenceNumber".into(), arg("sequenceNumber"));
                context.insert("userAddress".into(), self.operator().normalize());
            }
            "set-username" => {
                context.insert("username".into(), arg("username"));
                context.insert("userAddress".into(), self.operator().normalize());
            }
            "distribute-rewards" => {
                context.insert("leaderboard".into(), arg("leaderboard"));
            }
            _ => {}
        }
        context
    }

    fn submitter(&self) -> RelayResult<&TxSubmitter> {
        self.submitter.as_ref().ok_or_else(|| {
            RelayError::NotConfigured(format!(
                "operator private key (set {})",
                crate::blockchain::signer::PRIVATE_KEY_ENV_VAR
            ))
        })
    }

    /// `eth_call` a view function and decode its return.
    async fn view<C: SolCall>(&self, to: Address, call: C) -> RelayResult<C::Return> {
        let tx = TransactionRequest::default().with_to(to).with_input(call.abi_encode());
        let output = self.chain.call(tx).await?;
        C::abi_decode_returns(&output).map_err(|e| RelayError::Decode {
            call: C::SIGNATURE,
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("contracts", &self.contracts)
            .field("operator", &self.operator())
            .field("chest_opening_value", &self.chest_opening_value)
            .finish_non_exhaustive()
    }
}
