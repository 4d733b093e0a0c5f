//! ABI bindings for the three contracts the relay talks to.
//!
//! These interfaces are owned by the deployed contracts; the relay only
//! encodes calls and decodes returns and events against them.

use alloy::primitives::Address;
use alloy::sol;
use alloy::sol_types::SolEvent;

use crate::blockchain::types::ChainReceipt;

sol! {
    /// Chest opening contract backed by an entropy provider.
    interface IChestOpening {
        function requestChestOpening() external payable returns (uint64 sequenceNumber);
        function activateFallback(uint64 sequenceNumber) external;
        function getUserCoins(address user) external view returns (uint256);
        function getRequestStatus(uint64 sequenceNumber) external view returns (
            address requester,
            bool fulfilled,
            uint256 coinsReceived,
            uint256 timestamp,
            string status,
            string randomnessSource,
            bool canFallback
        );
        function getUserChestRequests(address user) external view returns (
            uint64[] sequenceNumbers,
            bool[] fulfilled,
            uint256[] coinsWon,
            uint256[] timestamps,
            string[] status,
            string[] randomnessSource
        );
        function getEntropyFee() external view returns (uint256);
        function canActivateFallback(uint64 sequenceNumber) external view returns (bool);
    }

    /// Staked lobby with usernames and reward distribution.
    interface ILobby {
        function setUsername(string _name) external;
        function distributeRewards(address[] leaderboard) external;
        function getLobbyPlayers() external view returns (address[]);
        function getUsername(address _addr) external view returns (string);
        function getRequiredETHAmount() external view returns (uint256 ethPrice, uint256 requiredWei);
        function checkStakeAmount(uint256 ethAmount) external view returns (uint256 usdValue, bool isValid);
        function hasStaked(address) external view returns (bool);
        function inLobby(address) external view returns (bool);
        function totalStaked() external view returns (uint256);
        function rewardsDistributed() external view returns (bool);
    }

    /// Auxiliary game contract: random numbers, kill feed, leaderboards.
    interface IGame {
        event RandomNumberGenerated(address indexed requester, uint256 randomNumber);
        event LeaderboardGenerated(address[] ranking);

        function generateRandomNumber() external returns (uint256);
        function recordKill(address killer, address victim) external;
        function generateLeaderboard(address[] players) external;
    }
}

/// Find and decode the first `E` event emitted by `emitter` in a receipt.
///
/// Logs are matched on their first topic (the event signature hash).
/// Returns `None` when no such log exists or it fails to decode.
pub fn find_event<E: SolEvent>(receipt: &ChainReceipt, emitter: Address) -> Option<E> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == emitter)
        .find(|log| log.data.topics().first() == Some(&E::SIGNATURE_HASH))
        .and_then(|log| match E::decode_log_data(&log.data) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(event = E::SIGNATURE, error = %e, "Matching log failed to decode");
                None
            }
        })
}
