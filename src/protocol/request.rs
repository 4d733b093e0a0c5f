//! Inbound frames.
//!
//! A frame is `{"event": "<name>", "id"?: <any>, "data"?: {..}}`. The envelope
//! is decoded first so a reply can always be addressed, then `event` and
//! `data` are decoded together into the closed [`RelayRequest`] set.

use alloy::primitives::Address;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::gateway::RelayError;

/// Every event name the relay answers.
pub const EVENT_NAMES: &[&str] = &[
    "test-connection",
    "get-user-coins",
    "get-request-status",
    "get-user-chest-requests",
    "get-entropy-fee",
    "can-activate-fallback",
    "get-lobby-players",
    "get-username",
    "get-required-eth",
    "check-stake-amount",
    "check-has-staked",
    "check-in-lobby",
    "get-total-staked",
    "rewards-distributed",
    "get-eth-balance",
    "request-chest-opening",
    "activate-fallback",
    "set-username",
    "distribute-rewards",
    "send-kill-data",
    "generate-random-number",
    "generate-game-leaderboard",
];

/// The outer frame.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Parse a text frame. Anything that is not an object with a string
    /// `event` is rejected.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decode the typed request carried by this envelope.
    pub fn into_request(self) -> Result<RelayRequest, RelayError> {
        RelayRequest::from_parts(&self.event, self.data)
    }
}

/// A client event with its decoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum RelayRequest {
    TestConnection {},

    // Chest reads
    GetUserCoins {
        #[serde(deserialize_with = "address_arg")]
        user_address: Address,
    },
    GetRequestStatus {
        #[serde(deserialize_with = "u64_arg")]
        sequence_number: u64,
    },
    GetUserChestRequests {
        #[serde(deserialize_with = "address_arg")]
        user_address: Address,
    },
    GetEntropyFee {},
    CanActivateFallback {
        #[serde(deserialize_with = "u64_arg")]
        sequence_number: u64,
    },

    // Lobby reads
    GetLobbyPlayers {},
    GetUsername {
        #[serde(deserialize_with = "address_arg")]
        user_address: Address,
    },
    GetRequiredEth {},
    CheckStakeAmount {
        #[serde(deserialize_with = "decimal_text_arg")]
        eth_amount: String,
    },
    CheckHasStaked {
        #[serde(deserialize_with = "address_arg")]
        user_address: Address,
    },
    CheckInLobby {
        #[serde(deserialize_with = "address_arg")]
        user_address: Address,
    },
    GetTotalStaked {},
    RewardsDistributed {},
    GetEthBalance {
        #[serde(deserialize_with = "address_arg")]
        address: Address,
    },

    // Writes
    RequestChestOpening {},
    ActivateFallback {
        #[serde(default, deserialize_with = "optional_sequence_arg")]
        sequence_number: Option<u64>,
    },
    SetUsername {
        username: String,
    },
    DistributeRewards {
        #[serde(deserialize_with = "address_list_arg")]
        leaderboard: Vec<Address>,
    },
    SendKillData {
        #[serde(deserialize_with = "address_arg")]
        killer: Address,
        #[serde(deserialize_with = "address_arg")]
        victim: Address,
    },
    GenerateRandomNumber {},
    GenerateGameLeaderboard {
        #[serde(deserialize_with = "address_list_arg")]
        players: Vec<Address>,
    },
}

impl RelayRequest {
    /// Decode an event name and its `data` payload.
    ///
    /// A missing or `null` payload counts as `{}`. `test-connection` ignores
    /// whatever it was sent.
    pub fn from_parts(event: &str, data: Value) -> Result<Self, RelayError> {
        if !EVENT_NAMES.contains(&event) {
            return Err(RelayError::UnknownEvent(event.to_string()));
        }

        let data = match data {
            Value::Null => Value::Object(Map::new()),
            _ if event == "test-connection" => Value::Object(Map::new()),
            other => other,
        };

        serde_json::from_value(json!({ "event": event, "data": data }))
            .map_err(|e| RelayError::InvalidArgument(e.to_string()))
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::TestConnection {} => "test-connection",
            Self::GetUserCoins { .. } => "get-user-coins",
            Self::GetRequestStatus { .. } => "get-request-status",
            Self::GetUserChestRequests { .. } => "get-user-chest-requests",
            Self::GetEntropyFee {} => "get-entropy-fee",
            Self::CanActivateFallback { .. } => "can-activate-fallback",
            Self::GetLobbyPlayers {} => "get-lobby-players",
            Self::GetUsername { .. } => "get-username",
            Self::GetRequiredEth {} => "get-required-eth",
            Self::CheckStakeAmount { .. } => "check-stake-amount",
            Self::CheckHasStaked { .. } => "check-has-staked",
            Self::CheckInLobby { .. } => "check-in-lobby",
            Self::GetTotalStaked {} => "get-total-staked",
            Self::RewardsDistributed {} => "rewards-distributed",
            Self::GetEthBalance { .. } => "get-eth-balance",
            Self::RequestChestOpening {} => "request-chest-opening",
            Self::ActivateFallback { .. } => "activate-fallback",
            Self::SetUsername { .. } => "set-username",
            Self::DistributeRewards { .. } => "distribute-rewards",
            Self::SendKillData { .. } => "send-kill-data",
            Self::GenerateRandomNumber {} => "generate-random-number",
            Self::GenerateGameLeaderboard { .. } => "generate-game-leaderboard",
        }
    }

    /// Whether handling this request signs a transaction.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::RequestChestOpening {}
                | Self::ActivateFallback { .. }
                | Self::SetUsername { .. }
                | Self::DistributeRewards { .. }
                | Self::SendKillData { .. }
                | Self::GenerateRandomNumber {}
                | Self::GenerateGameLeaderboard { .. }
        )
    }
}

/// The `&'static` form of a client-supplied event name, for metric labels.
pub fn known_event(event: &str) -> Option<&'static str> {
    EVENT_NAMES.iter().copied().find(|name| *name == event)
}

fn parse_address<E: de::Error>(value: &str) -> Result<Address, E> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| E::custom(format!("invalid address \"{}\"", value)))
}

fn address_arg<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
    let value = String::deserialize(deserializer)?;
    parse_address(&value)
}

fn address_list_arg<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Address>, D::Error> {
    let values = Vec::<String>::deserialize(deserializer)?;
    values.iter().map(|v| parse_address(v)).collect()
}

/// An unsigned integer sent either as a JSON number or a decimal string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

fn u64_from<E: de::Error>(raw: NumberOrText) -> Result<u64, E> {
    match raw {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid unsigned integer \"{}\"", s))),
    }
}

fn u64_arg<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    u64_from(NumberOrText::deserialize(deserializer)?)
}

/// Sequence numbers start at 1; a zero or null one asks for auto-discovery.
fn optional_sequence_arg<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => u64_from(raw).map(|n| (n != 0).then_some(n)),
    }
}

fn decimal_text_arg<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected a decimal amount, got {}", other))),
    }
}
