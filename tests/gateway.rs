//! Gateway behaviour against an in-memory chain.

mod common;

use alloy::consensus::Transaction;
use alloy::primitives::{Address, Log, U256};
use alloy::sol_types::{SolCall, SolEvent, SolValue};
use serde_json::{json, Value};

use chest_relay::blockchain::contracts::{IChestOpening, IGame, ILobby};
use chest_relay::config::ContractsConfig;
use chest_relay::Gateway;
use common::*;

fn frame(event: &str, data: Value) -> String {
    json!({ "event": event, "id": "t-1", "data": data }).to_string()
}

fn is_decimal(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
}

/// Operator has requests `sequence_numbers`, none fulfilled; only those in
/// `eligible` pass `canActivateFallback`.
fn seed_requests(chain: &MockChain, sequence_numbers: Vec<u64>, eligible: &'static [u64]) {
    let n = sequence_numbers.len();
    chain.respond_with(
        IChestOpening::getUserChestRequestsCall::SELECTOR,
        (
            sequence_numbers,
            vec![false; n],
            vec![U256::ZERO; n],
            vec![U256::from(1_700_000_000u64); n],
            vec!["pending".to_string(); n],
            vec!["entropy".to_string(); n],
        )
            .abi_encode_params(),
    );
    chain.respond(IChestOpening::canActivateFallbackCall::SELECTOR, move |input| {
        let call = IChestOpening::canActivateFallbackCall::abi_decode(input).unwrap();
        Ok(eligible.contains(&call.sequenceNumber).abi_encode())
    });
}

fn fallback_checks(chain: &MockChain) -> Vec<u64> {
    chain
        .calls()
        .iter()
        .filter(|c| c.input.starts_with(&IChestOpening::canActivateFallbackCall::SELECTOR))
        .map(|c| {
            IChestOpening::canActivateFallbackCall::abi_decode(&c.input)
                .unwrap()
                .sequenceNumber
        })
        .collect()
}

#[tokio::test]
async fn read_results_use_decimal_strings_at_every_depth() {
    let chain = MockChain::new();
    let huge = U256::MAX - U256::from(1);
    chain.respond_with(
        IChestOpening::getUserChestRequestsCall::SELECTOR,
        (
            vec![u64::MAX, 2u64],
            vec![true, false],
            vec![huge, U256::from(3)],
            vec![U256::from(1_700_000_000u64), U256::from(1_700_000_100u64)],
            vec!["fulfilled".to_string(), "pending".to_string()],
            vec!["entropy".to_string(), "fallback".to_string()],
        )
            .abi_encode_params(),
    );
    let gateway = gateway(chain.clone());

    let user = Address::repeat_byte(0x77);
    let response = gateway
        .respond(&frame("get-user-chest-requests", json!({ "userAddress": user })))
        .await;

    assert_eq!(response.event, "get-user-chest-requests-result");
    assert_eq!(response.id, Some(json!("t-1")));
    assert_eq!(response.data["success"], true, "{}", response.data);
    for field in ["sequenceNumbers", "coinsWon", "timestamps"] {
        for item in response.data[field].as_array().unwrap() {
            assert!(is_decimal(item), "{field}: {item}");
        }
    }
    assert_eq!(response.data["sequenceNumbers"][0], u64::MAX.to_string());
    assert_eq!(response.data["coinsWon"][0], huge.to_string());
    assert_eq!(response.data["fulfilled"], json!([true, false]));
    assert_eq!(response.data["userAddress"], user.to_checksum(None));
}

#[tokio::test]
async fn entropy_fee_reports_wei_and_ether() {
    let chain = MockChain::new();
    chain.respond_with(
        IChestOpening::getEntropyFeeCall::SELECTOR,
        U256::from(15_000_000_000_001u64).abi_encode(),
    );
    let response = gateway(chain).respond(&frame("get-entropy-fee", Value::Null)).await;

    assert_eq!(response.data["success"], true);
    assert_eq!(response.data["fee"], "15000000000001");
    assert!(response.data["feeInEth"].as_str().unwrap().starts_with("0.000015"));
}

#[tokio::test]
async fn lobby_reads_decode_tuple_returns() {
    let chain = MockChain::new();
    chain.respond_with(
        ILobby::getRequiredETHAmountCall::SELECTOR,
        (U256::from(3_000u64), U256::from(10u64).pow(U256::from(16))).abi_encode_params(),
    );
    chain.respond_with(
        ILobby::getLobbyPlayersCall::SELECTOR,
        vec![Address::repeat_byte(1), Address::repeat_byte(2)].abi_encode(),
    );
    let gateway = gateway(chain);

    let required = gateway.respond(&frame("get-required-eth", json!({}))).await;
    assert_eq!(required.data["ethPrice"], "3000");
    assert_eq!(required.data["requiredWei"], "10000000000000000");
    assert!(required.data["requiredEth"].as_str().unwrap().starts_with("0.01"));

    let players = gateway.respond(&frame("get-lobby-players", json!({}))).await;
    assert_eq!(players.data["playerCount"], 2);
    assert_eq!(players.data["players"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn stake_amount_is_parsed_as_ether() {
    let chain = MockChain::new();
    chain.respond(ILobby::checkStakeAmountCall::SELECTOR, |input| {
        let call = ILobby::checkStakeAmountCall::abi_decode(input).unwrap();
        assert_eq!(call.ethAmount, U256::from(500_000_000_000_000_000u64));
        Ok((U256::from(1_500u64), true).abi_encode_params())
    });
    let gateway = gateway(chain.clone());

    let response = gateway
        .respond(&frame("check-stake-amount", json!({ "ethAmount": "0.5" })))
        .await;
    assert_eq!(response.data["success"], true, "{}", response.data);
    assert_eq!(response.data["usdValue"], "1500");
    assert_eq!(response.data["isValid"], true);

    let calls_before = chain.calls().len();
    let bad = gateway
        .respond(&frame("check-stake-amount", json!({ "ethAmount": "lots" })))
        .await;
    assert_eq!(bad.data["success"], false);
    assert_eq!(chain.calls().len(), calls_before);
}

#[tokio::test]
async fn per_user_reads_echo_their_arguments() {
    let chain = MockChain::new();
    let player = Address::repeat_byte(0x99);
    chain.respond_with(
        IChestOpening::getRequestStatusCall::SELECTOR,
        (
            player,
            false,
            U256::ZERO,
            U256::from(1_700_000_000u64),
            "pending".to_string(),
            "entropy".to_string(),
            true,
        )
            .abi_encode_params(),
    );
    chain.respond_with(ILobby::getUsernameCall::SELECTOR, ("neo".to_string(),).abi_encode_params());
    chain.respond_with(ILobby::hasStakedCall::SELECTOR, true.abi_encode());
    chain.respond_with(ILobby::inLobbyCall::SELECTOR, false.abi_encode());
    chain.respond_with(
        ILobby::totalStakedCall::SELECTOR,
        U256::from(3_000_000_000_000_000_000u128).abi_encode(),
    );
    seed_requests(&chain, vec![41], &[41]);
    let gateway = gateway(chain);

    let status = gateway
        .respond(&frame("get-request-status", json!({ "sequenceNumber": "41" })))
        .await;
    assert_eq!(status.data["success"], true, "{}", status.data);
    assert_eq!(status.data["sequenceNumber"], "41");
    assert_eq!(status.data["requester"], player.to_checksum(None));
    assert_eq!(status.data["timestamp"], "1700000000");
    assert_eq!(status.data["canFallback"], true);

    let username = gateway
        .respond(&frame("get-username", json!({ "userAddress": player })))
        .await;
    assert_eq!(username.data["username"], "neo");

    let staked = gateway
        .respond(&frame("check-has-staked", json!({ "userAddress": player })))
        .await;
    assert_eq!(staked.data["hasStaked"], true);

    let lobby = gateway
        .respond(&frame("check-in-lobby", json!({ "userAddress": player })))
        .await;
    assert_eq!(lobby.data["inLobby"], false);

    let total = gateway.respond(&frame("get-total-staked", json!({}))).await;
    assert_eq!(total.data["totalStaked"], "3000000000000000000");

    let fallback = gateway
        .respond(&frame("can-activate-fallback", json!({ "sequenceNumber": 41 })))
        .await;
    assert_eq!(fallback.data["sequenceNumber"], "41");
    assert_eq!(fallback.data["canActivate"], true);
}

#[tokio::test]
async fn eth_balance_is_read_from_chain() {
    let chain = MockChain::new();
    let who = Address::repeat_byte(0x42);
    chain.set_balance(who, U256::from(2_500_000_000_000_000_000u128));

    let response = gateway(chain)
        .respond(&frame("get-eth-balance", json!({ "address": who })))
        .await;
    assert_eq!(response.data["balance"], "2500000000000000000");
    assert_eq!(response.data["balanceEth"].as_str().unwrap().trim_end_matches('0'), "2.5");
}

#[tokio::test]
async fn gas_estimation_failure_submits_nothing() {
    let chain = MockChain::new();
    chain.fail_estimate("Username already taken");
    let gateway = gateway(chain.clone());

    let response = gateway
        .respond(&frame("set-username", json!({ "username": "neo" })))
        .await;

    assert_eq!(response.event, "set-username-result");
    assert_eq!(response.data["success"], false);
    let error = response.data["error"].as_str().unwrap();
    assert!(error.contains("Gas estimation failed"), "{error}");
    assert!(error.contains("Username already taken"), "{error}");
    assert_eq!(response.data["username"], "neo");
    assert_eq!(response.data["userAddress"], operator().to_checksum(None));

    assert!(chain.sent().is_empty());
    assert_eq!(chain.nonce_lookups(), 0);
}

#[tokio::test]
async fn fallback_discovery_picks_newest_eligible_request() {
    let chain = MockChain::new();
    seed_requests(&chain, vec![5, 7, 9], &[7]);
    let gateway = gateway(chain.clone());

    let response = gateway.respond(&frame("activate-fallback", json!({}))).await;

    assert_eq!(response.data["success"], true, "{}", response.data);
    assert_eq!(response.data["sequenceNumber"], "7");
    assert_eq!(response.data["userAddress"], operator().to_checksum(None));

    // Newest first, stop at the first hit, then re-check before signing.
    assert_eq!(fallback_checks(&chain), vec![9, 7, 7]);

    let sent = chain.sent_transactions();
    assert_eq!(sent.len(), 1);
    let call = IChestOpening::activateFallbackCall::abi_decode(sent[0].input()).unwrap();
    assert_eq!(call.sequenceNumber, 7);
    assert_eq!(sent[0].to(), Some(contracts().chest));
}

#[tokio::test]
async fn fallback_without_eligible_request_never_submits() {
    let chain = MockChain::new();
    seed_requests(&chain, vec![5, 7, 9], &[]);
    let gateway = gateway(chain.clone());

    let response = gateway.respond(&frame("activate-fallback", Value::Null)).await;

    assert_eq!(response.data["success"], false);
    assert!(response.data["error"]
        .as_str()
        .unwrap()
        .starts_with("No eligible request"));
    assert_eq!(response.data["sequenceNumber"], Value::Null);
    assert_eq!(response.data["userAddress"], operator().to_checksum(None));

    assert_eq!(chain.estimate_count(), 0);
    assert_eq!(chain.nonce_lookups(), 0);
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn explicit_fallback_target_is_verified() {
    let chain = MockChain::new();
    seed_requests(&chain, vec![3], &[]);
    let gateway = gateway(chain.clone());

    let response = gateway
        .respond(&frame("activate-fallback", json!({ "sequenceNumber": "3" })))
        .await;

    assert_eq!(response.data["success"], false);
    assert_eq!(response.data["sequenceNumber"], "3");
    assert!(response.data["error"].as_str().unwrap().contains("not eligible"));
    assert_eq!(fallback_checks(&chain), vec![3]);
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn empty_leaderboard_fails_before_any_network_call() {
    let chain = MockChain::new();
    let gateway = gateway(chain.clone());

    let response = gateway
        .respond(&frame("distribute-rewards", json!({ "leaderboard": [] })))
        .await;

    assert_eq!(response.data["success"], false);
    assert!(response.data["error"].as_str().unwrap().contains("leaderboard"));
    assert_eq!(response.data["leaderboard"], json!([]));
    assert_eq!(chain.network_calls(), 0);

    let players = gateway
        .respond(&frame("generate-game-leaderboard", json!({ "players": [] })))
        .await;
    assert_eq!(players.data["success"], false);
    assert_eq!(chain.network_calls(), 0);
}

#[tokio::test]
async fn invalid_addresses_fail_locally() {
    let chain = MockChain::new();
    let gateway = gateway(chain.clone());

    let response = gateway
        .respond(&frame("send-kill-data", json!({ "killer": "alice", "victim": "bob" })))
        .await;

    assert_eq!(response.event, "send-kill-data-result");
    assert_eq!(response.data["success"], false);
    assert!(response.data["error"].as_str().unwrap().starts_with("Invalid argument"));
    assert_eq!(chain.network_calls(), 0);
}

#[tokio::test]
async fn random_number_is_decoded_from_receipt_logs() {
    let chain = MockChain::new();
    let value = U256::from(10u64).pow(U256::from(30)) + U256::from(7);
    let event = IGame::RandomNumberGenerated {
        requester: operator(),
        randomNumber: value,
    };
    chain.emit_logs(vec![
        // Same event from another contract must be ignored.
        Log {
            address: Address::repeat_byte(0xee),
            data: IGame::RandomNumberGenerated {
                requester: operator(),
                randomNumber: U256::from(1),
            }
            .encode_log_data(),
        },
        Log {
            address: contracts().game,
            data: event.encode_log_data(),
        },
    ]);
    let gateway = gateway(chain.clone());

    let response = gateway.respond(&frame("generate-random-number", json!({}))).await;

    assert_eq!(response.data["success"], true, "{}", response.data);
    assert_eq!(response.data["randomNumber"], value.to_string());
    assert_eq!(response.data["receipt"]["logs"].as_array().unwrap().len(), 2);
    assert!(is_decimal(&response.data["receipt"]["blockNumber"]));
    assert_eq!(response.data["txHash"], response.data["receipt"]["transactionHash"]);
}

#[tokio::test]
async fn missing_random_number_log_reports_null() {
    let chain = MockChain::new();
    let gateway = gateway(chain.clone());

    let response = gateway.respond(&frame("generate-random-number", json!({}))).await;

    assert_eq!(response.data["success"], true, "{}", response.data);
    assert_eq!(response.data["randomNumber"], Value::Null);
    assert_eq!(chain.sent().len(), 1);
}

#[tokio::test]
async fn leaderboard_ranking_is_decoded() {
    let chain = MockChain::new();
    let players = vec![Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3)];
    let ranking = vec![players[2], players[0], players[1]];
    chain.emit_logs(vec![Log {
        address: contracts().game,
        data: IGame::LeaderboardGenerated { ranking: ranking.clone() }.encode_log_data(),
    }]);
    let gateway = gateway(chain.clone());

    let response = gateway
        .respond(&frame("generate-game-leaderboard", json!({ "players": players })))
        .await;

    assert_eq!(response.data["success"], true, "{}", response.data);
    let expected: Vec<String> = ranking.iter().map(|a| a.to_checksum(None)).collect();
    assert_eq!(response.data["ranking"], json!(expected));
}

#[tokio::test]
async fn signed_transaction_uses_estimate_and_gas_policy() {
    let chain = MockChain::new();
    let gateway = gateway(chain.clone());
    let killer = Address::repeat_byte(0x0a);
    let victim = Address::repeat_byte(0x0b);

    let response = gateway
        .respond(&frame("send-kill-data", json!({ "killer": killer, "victim": victim })))
        .await;
    assert_eq!(response.data["success"], true, "{}", response.data);

    let sent = chain.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_signed_by_policy(&sent[0]);
    assert_eq!(sent[0].to(), Some(contracts().game));
    assert_eq!(sent[0].value(), U256::ZERO);
    let call = IGame::recordKillCall::abi_decode(sent[0].input()).unwrap();
    assert_eq!((call.killer, call.victim), (killer, victim));
}

#[tokio::test]
async fn chest_opening_pays_configured_value_or_entropy_fee() {
    let chain = MockChain::new();
    chain.respond_with(
        IChestOpening::getEntropyFeeCall::SELECTOR,
        U256::from(42u64).abi_encode(),
    );

    let fixed = gateway(chain.clone()).with_chest_opening_value(Some(U256::from(15_000_000_000_001u64)));
    let response = fixed.respond(&frame("request-chest-opening", json!({}))).await;
    assert_eq!(response.data["success"], true, "{}", response.data);

    let from_fee = gateway(chain.clone());
    let response = from_fee.respond(&frame("request-chest-opening", json!({}))).await;
    assert_eq!(response.data["success"], true, "{}", response.data);

    let sent = chain.sent_transactions();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].value(), U256::from(15_000_000_000_001u64));
    assert_eq!(sent[1].value(), U256::from(42u64));
    assert_eq!(sent[0].nonce() + 1, sent[1].nonce());
}

#[tokio::test]
async fn mined_failure_is_reported_with_hash() {
    let chain = MockChain::new();
    chain.revert_on_chain();
    let gateway = gateway(chain.clone());

    let response = gateway
        .respond(&frame("set-username", json!({ "username": "trinity" })))
        .await;

    assert_eq!(response.data["success"], false);
    let error = response.data["error"].as_str().unwrap();
    assert!(error.contains("failed on-chain"), "{error}");
    assert!(error.contains("0x"), "{error}");
}

#[tokio::test]
async fn writes_without_operator_key_are_not_configured() {
    let chain = MockChain::new();
    chain.respond_with(ILobby::rewardsDistributedCall::SELECTOR, true.abi_encode());
    let gateway = read_only_gateway(chain.clone());

    let write = gateway.respond(&frame("generate-random-number", json!({}))).await;
    assert_eq!(write.data["success"], false);
    assert!(write.data["error"].as_str().unwrap().starts_with("Not configured"));
    assert_eq!(chain.network_calls(), 0);

    let read = gateway.respond(&frame("rewards-distributed", json!({}))).await;
    assert_eq!(read.data["success"], true);
    assert_eq!(read.data["rewardsDistributed"], true);
}

#[tokio::test]
async fn unknown_event_and_malformed_frames() {
    let gateway = gateway(MockChain::new());

    let unknown = gateway.respond(r#"{"event":"open-vault","id":9}"#).await;
    assert_eq!(unknown.event, "open-vault-result");
    assert_eq!(unknown.id, Some(json!(9)));
    assert_eq!(unknown.data["success"], false);
    assert!(unknown.data["error"].as_str().unwrap().contains("open-vault"));

    let malformed = gateway.respond("{not json").await;
    assert_eq!(malformed.event, "error");
    assert_eq!(malformed.data["success"], false);
}

#[tokio::test]
async fn test_connection_answers_without_chain() {
    let chain = MockChain::new();
    let response = gateway(chain.clone())
        .respond(r#"{"event":"test-connection","data":{"hello":"world"}}"#)
        .await;

    assert_eq!(response.data["success"], true);
    assert!(response.data["timestamp"].as_str().unwrap().contains('T'));
    assert_eq!(chain.network_calls(), 0);
}

#[tokio::test]
async fn argument_failures_still_echo_context() {
    let chain = MockChain::new();
    let gateway = gateway(chain.clone());
    let operator = operator().to_checksum(None);

    let leaderboard = json!(["0x0000000000000000000000000000000000000001", "nope"]);
    let rewards = gateway
        .respond(&frame("distribute-rewards", json!({ "leaderboard": leaderboard })))
        .await;
    assert_eq!(rewards.data["success"], false);
    assert!(rewards.data["error"].as_str().unwrap().contains("nope"));
    assert_eq!(rewards.data["leaderboard"], leaderboard);

    let username = gateway.respond(&frame("set-username", json!({}))).await;
    assert_eq!(username.data["success"], false);
    assert_eq!(username.data["username"], Value::Null);
    assert_eq!(username.data["userAddress"], operator);

    let fallback = gateway
        .respond(&frame("activate-fallback", json!({ "sequenceNumber": "abc" })))
        .await;
    assert_eq!(fallback.data["success"], false);
    assert_eq!(fallback.data["sequenceNumber"], "abc");
    assert_eq!(fallback.data["userAddress"], operator);

    assert_eq!(chain.network_calls(), 0);
}

#[tokio::test]
async fn concurrent_writes_never_share_a_nonce() {
    let chain = MockChain::new();
    chain.slow_broadcasts(std::time::Duration::from_millis(20));
    let gateway = std::sync::Arc::new(gateway(chain.clone()));

    let writes = (0..5).map(|i| {
        let gateway = std::sync::Arc::clone(&gateway);
        tokio::spawn(async move {
            gateway
                .respond(&frame("set-username", json!({ "username": format!("agent-{i}") })))
                .await
        })
    });
    for write in writes.collect::<Vec<_>>() {
        let response = write.await.unwrap();
        assert_eq!(response.data["success"], true, "{}", response.data);
    }

    let mut nonces: Vec<u64> = chain.sent_transactions().iter().map(|tx| tx.nonce()).collect();
    nonces.sort_unstable();
    assert_eq!(nonces, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn entropy_fee_setting_pays_the_live_fee() {
    let chain = MockChain::new();
    chain.respond_with(
        IChestOpening::getEntropyFeeCall::SELECTOR,
        U256::from(77u64).abi_encode(),
    );
    let config = ContractsConfig {
        game_address: "0x0000000000000000000000000000000000000abc".into(),
        chest_opening_value_wei: Some("entropy-fee".into()),
        ..ContractsConfig::default()
    };
    let gateway = Gateway::from_config(chain.clone(), Some(submitter(chain.clone())), &config).unwrap();

    let response = gateway.respond(&frame("request-chest-opening", json!({}))).await;
    assert_eq!(response.data["success"], true, "{}", response.data);
    assert_eq!(chain.sent_transactions()[0].value(), U256::from(77u64));

    let empty = ContractsConfig {
        chest_opening_value_wei: Some(String::new()),
        ..config
    };
    assert!(Gateway::from_config(chain, None, &empty).is_err());
}
