//! Read-only events: view calls and balance lookups.

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::Address;
use chrono::Utc;
use serde_json::{json, Value};

use crate::blockchain::contracts::{IChestOpening, ILobby};
use crate::blockchain::normalize::Normalize;
use crate::gateway::{Gateway, RelayError, RelayResult};

impl Gateway {
    pub(super) fn test_connection(&self) -> Value {
        json!({
            "message": "Relay is working",
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    pub(super) async fn get_user_coins(&self, user: Address) -> RelayResult<Value> {
        let coins = self
            .view(self.contracts.chest, IChestOpening::getUserCoinsCall { user })
            .await?;
        Ok(json!({
            "coins": coins.normalize(),
            "userAddress": user.normalize(),
        }))
    }

    pub(super) async fn get_request_status(&self, sequence_number: u64) -> RelayResult<Value> {
        let status = self
            .view(
                self.contracts.chest,
                IChestOpening::getRequestStatusCall {
                    sequenceNumber: sequence_number,
                },
            )
            .await?;
        Ok(json!({
            "sequenceNumber": sequence_number.normalize(),
            "requester": status.requester.normalize(),
            "fulfilled": status.fulfilled,
            "coinsReceived": status.coinsReceived.normalize(),
            "timestamp": status.timestamp.normalize(),
            "status": status.status,
            "randomnessSource": status.randomnessSource,
            "canFallback": status.canFallback,
        }))
    }

    pub(super) async fn get_user_chest_requests(&self, user: Address) -> RelayResult<Value> {
        let requests = self
            .view(self.contracts.chest, IChestOpening::getUserChestRequestsCall { user })
            .await?;
        Ok(json!({
            "userAddress": user.normalize(),
            "sequenceNumbers": requests.sequenceNumbers.normalize(),
            "fulfilled": requests.fulfilled,
            "coinsWon": requests.coinsWon.normalize(),
            "timestamps": requests.timestamps.normalize(),
            "status": requests.status,
            "randomnessSource": requests.randomnessSource,
        }))
    }

    pub(super) async fn get_entropy_fee(&self) -> RelayResult<Value> {
        let fee = self
            .view(self.contracts.chest, IChestOpening::getEntropyFeeCall {})
            .await?;
        Ok(json!({
            "fee": fee.normalize(),
            "feeInEth": format_ether(fee),
        }))
    }

    pub(super) async fn can_activate_fallback(&self, sequence_number: u64) -> RelayResult<Value> {
        let can_activate = self.fallback_allowed(sequence_number).await?;
        Ok(json!({
            "sequenceNumber": sequence_number.normalize(),
            "canActivate": can_activate,
        }))
    }

    pub(super) async fn get_lobby_players(&self) -> RelayResult<Value> {
        let players = self
            .view(self.contracts.lobby, ILobby::getLobbyPlayersCall {})
            .await?;
        Ok(json!({
            "playerCount": players.len(),
            "players": players.normalize(),
        }))
    }

    pub(super) async fn get_username(&self, user: Address) -> RelayResult<Value> {
        let username = self
            .view(self.contracts.lobby, ILobby::getUsernameCall { _addr: user })
            .await?;
        Ok(json!({
            "userAddress": user.normalize(),
            "username": username,
        }))
    }

    pub(super) async fn get_required_eth(&self) -> RelayResult<Value> {
        let required = self
            .view(self.contracts.lobby, ILobby::getRequiredETHAmountCall {})
            .await?;
        Ok(json!({
            "ethPrice": required.ethPrice.normalize(),
            "requiredWei": required.requiredWei.normalize(),
            "requiredEth": format_ether(required.requiredWei),
        }))
    }

    pub(super) async fn check_stake_amount(&self, eth_amount: &str) -> RelayResult<Value> {
        let wei = parse_ether(eth_amount.trim())
            .map_err(|e| RelayError::InvalidArgument(format!("ethAmount \"{}\": {}", eth_amount, e)))?;
        let check = self
            .view(self.contracts.lobby, ILobby::checkStakeAmountCall { ethAmount: wei })
            .await?;
        Ok(json!({
            "ethAmount": eth_amount,
            "usdValue": check.usdValue.normalize(),
            "isValid": check.isValid,
        }))
    }

    pub(super) async fn check_has_staked(&self, user: Address) -> RelayResult<Value> {
        let has_staked = self
            .view(self.contracts.lobby, ILobby::hasStakedCall(user))
            .await?;
        Ok(json!({
            "userAddress": user.normalize(),
            "hasStaked": has_staked,
        }))
    }

    pub(super) async fn check_in_lobby(&self, user: Address) -> RelayResult<Value> {
        let in_lobby = self
            .view(self.contracts.lobby, ILobby::inLobbyCall(user))
            .await?;
        Ok(json!({
            "userAddress": user.normalize(),
            "inLobby": in_lobby,
        }))
    }

    pub(super) async fn get_total_staked(&self) -> RelayResult<Value> {
        let total = self
            .view(self.contracts.lobby, ILobby::totalStakedCall {})
            .await?;
        Ok(json!({
            "totalStaked": total.normalize(),
            "totalStakedEth": format_ether(total),
        }))
    }

    pub(super) async fn rewards_distributed(&self) -> RelayResult<Value> {
        let distributed = self
            .view(self.contracts.lobby, ILobby::rewardsDistributedCall {})
            .await?;
        Ok(json!({ "rewardsDistributed": distributed }))
    }

    pub(super) async fn get_eth_balance(&self, address: Address) -> RelayResult<Value> {
        let balance = self.chain.balance(address).await?;
        Ok(json!({
            "address": address.normalize(),
            "balance": balance.normalize(),
            "balanceEth": format_ether(balance),
        }))
    }
}
