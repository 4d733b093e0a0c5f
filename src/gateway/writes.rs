//! State-changing events. Each one is signed by the operator account and
//! answered only after the transaction is mined.
//!
//! Argument checks run before anything touches the network.

use alloy::primitives::Address;
use alloy::sol_types::SolCall;
use serde_json::{json, Value};

use crate::blockchain::contracts::{find_event, IChestOpening, IGame, ILobby};
use crate::blockchain::normalize::Normalize;
use crate::blockchain::{ChainReceipt, WriteRequest};
use crate::gateway::{Gateway, RelayError, RelayResult};

impl Gateway {
    pub(super) async fn request_chest_opening(&self) -> RelayResult<Value> {
        let submitter = self.submitter()?;

        let value = match self.chest_opening_value {
            Some(value) => value,
            None => {
                self.view(self.contracts.chest, IChestOpening::getEntropyFeeCall {})
                    .await?
            }
        };

        let request = WriteRequest::new(
            "requestChestOpening",
            self.contracts.chest,
            IChestOpening::requestChestOpeningCall {}.abi_encode(),
        )
        .with_value(value);
        let receipt = submitter.submit(request).await?;

        Ok(with_receipt(json!({}), &receipt))
    }

    pub(super) async fn activate_fallback(&self, requested: Option<u64>) -> RelayResult<Value> {
        let submitter = self.submitter()?;
        let operator = submitter.address();

        let target = self.fallback_target(requested, operator).await?;
        tracing::info!(sequence_number = target, "Activating fallback");

        let request = WriteRequest::new(
            "activateFallback",
            self.contracts.chest,
            IChestOpening::activateFallbackCall { sequenceNumber: target }.abi_encode(),
        );
        let receipt = submitter.submit(request).await?;

        Ok(with_receipt(
            json!({
                "sequenceNumber": target.normalize(),
                "userAddress": operator.normalize(),
            }),
            &receipt,
        ))
    }

    pub(super) async fn set_username(&self, username: String) -> RelayResult<Value> {
        let submitter = self.submitter()?;
        if username.trim().is_empty() {
            return Err(RelayError::InvalidArgument(
                "username is required and cannot be empty".into(),
            ));
        }

        let request = WriteRequest::new(
            "setUsername",
            self.contracts.lobby,
            ILobby::setUsernameCall { _name: username.clone() }.abi_encode(),
        );
        let receipt = submitter.submit(request).await?;

        Ok(with_receipt(
            json!({
                "username": username,
                "userAddress": submitter.address().normalize(),
            }),
            &receipt,
        ))
    }

    pub(super) async fn distribute_rewards(&self, leaderboard: Vec<Address>) -> RelayResult<Value> {
        let submitter = self.submitter()?;
        if leaderboard.is_empty() {
            return Err(RelayError::InvalidArgument(
                "leaderboard must contain at least one address".into(),
            ));
        }

        let request = WriteRequest::new(
            "distributeRewards",
            self.contracts.lobby,
            ILobby::distributeRewardsCall {
                leaderboard: leaderboard.clone(),
            }
            .abi_encode(),
        );
        let receipt = submitter.submit(request).await?;

        Ok(with_receipt(json!({ "leaderboard": leaderboard.normalize() }), &receipt))
    }

    pub(super) async fn send_kill_data(&self, killer: Address, victim: Address) -> RelayResult<Value> {
        let submitter = self.submitter()?;

        let request = WriteRequest::new(
            "recordKill",
            self.contracts.game,
            IGame::recordKillCall { killer, victim }.abi_encode(),
        );
        let receipt = submitter.submit(request).await?;

        Ok(with_receipt(
            json!({
                "killer": killer.normalize(),
                "victim": victim.normalize(),
            }),
            &receipt,
        ))
    }

    pub(super) async fn generate_random_number(&self) -> RelayResult<Value> {
        let submitter = self.submitter()?;

        let request = WriteRequest::new(
            "generateRandomNumber",
            self.contracts.game,
            IGame::generateRandomNumberCall {}.abi_encode(),
        );
        let receipt = submitter.submit(request).await?;

        let random_number = find_event::<IGame::RandomNumberGenerated>(&receipt, self.contracts.game)
            .map(|event| event.randomNumber);
        if random_number.is_none() {
            tracing::warn!(tx_hash = %receipt.transaction_hash, "No RandomNumberGenerated log in receipt");
        }

        Ok(with_receipt(json!({ "randomNumber": random_number.normalize() }), &receipt))
    }

    pub(super) async fn generate_game_leaderboard(&self, players: Vec<Address>) -> RelayResult<Value> {
        let submitter = self.submitter()?;
        if players.is_empty() {
            return Err(RelayError::InvalidArgument(
                "players must contain at least one address".into(),
            ));
        }

        let request = WriteRequest::new(
            "generateLeaderboard",
            self.contracts.game,
            IGame::generateLeaderboardCall { players }.abi_encode(),
        );
        let receipt = submitter.submit(request).await?;

        let ranking = find_event::<IGame::LeaderboardGenerated>(&receipt, self.contracts.game)
            .map(|event| event.ranking);

        Ok(with_receipt(json!({ "ranking": ranking.normalize() }), &receipt))
    }
}

fn with_receipt(mut payload: Value, receipt: &ChainReceipt) -> Value {
    if let Value::Object(fields) = &mut payload {
        fields.insert("txHash".into(), receipt.transaction_hash.normalize());
        fields.insert("receipt".into(), receipt.normalize());
    }
    payload
}
