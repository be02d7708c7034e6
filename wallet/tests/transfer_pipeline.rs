//! Integration tests for the wallet RPC transfer pipeline.
//!
//! Every test drives [`RpcService`] with JSON envelopes, exactly as the HTTP
//! layer does, against the in-memory engine. Construction limits are tuned
//! per test where a scenario needs oversized transactions.

use serde_json::{json, Value};

use solace_wallet::address::Network;
use solace_wallet::config::{RetryPolicy, RpcOptions};
use solace_wallet::engine::{ConstructionLimits, MemoryWallet, WalletEngine};
use solace_wallet::rpc::{JsonRpcRequest, RpcService};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn service_with(wallet: MemoryWallet, options: RpcOptions) -> RpcService<MemoryWallet> {
    RpcService::new(wallet, options)
}

fn service() -> RpcService<MemoryWallet> {
    service_with(MemoryWallet::dev(Network::Testnet), RpcOptions::default())
}

fn envelope(method: &str, params: Value) -> JsonRpcRequest {
    serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": "test",
        "method": method,
        "params": params,
    }))
    .expect("valid envelope")
}

/// Calls `method` and returns its result, failing the test on an error.
fn call(service: &mut RpcService<MemoryWallet>, method: &str, params: Value) -> Value {
    let response = service.handle(envelope(method, params));
    if let Some(error) = response.error {
        panic!("{method} failed: {} {}", error.code, error.message);
    }
    response.result.expect("result present")
}

/// Calls `method` and returns the error code, failing the test on success.
fn call_err(service: &mut RpcService<MemoryWallet>, method: &str, params: Value) -> i32 {
    let response = service.handle(envelope(method, params));
    response
        .error
        .unwrap_or_else(|| panic!("{method} unexpectedly succeeded"))
        .code
}

fn primary_address(service: &mut RpcService<MemoryWallet>) -> String {
    call(service, "getaddress", json!({}))["address"]
        .as_str()
        .expect("address string")
        .to_string()
}

fn recipients(address: &str, count: usize, amount: u64) -> Value {
    Value::Array(
        (0..count)
            .map(|_| json!({"address": address, "amount": amount}))
            .collect(),
    )
}

fn tight_limits(tx_size_limit: u64) -> MemoryWallet {
    let mut wallet = MemoryWallet::dev(Network::Testnet);
    wallet.set_limits(ConstructionLimits {
        tx_size_limit,
        ..ConstructionLimits::default()
    });
    wallet
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[test]
fn transfer_then_refresh_moves_pending_to_out() {
    let mut service = service();
    let address = primary_address(&mut service);

    let sent = call(
        &mut service,
        "transfer",
        json!({"destinations": recipients(&address, 2, 3_000_000_000)}),
    );
    let tx_hash = sent["tx_hash"].as_str().unwrap().to_string();
    assert!(sent.get("tx_key").is_none());

    let history = call(&mut service, "get_transfers", json!({"pending": true, "out": true}));
    assert_eq!(history["pending"][0]["txid"], tx_hash.as_str());
    assert_eq!(history["pending"][0]["amount"], 6_000_000_000u64);
    assert_eq!(history["pending"][0]["type"], "pending");
    assert!(history.get("out").is_none());

    service.refresh().unwrap();
    let history = call(&mut service, "get_transfers", json!({"pending": true, "out": true}));
    assert!(history.get("pending").is_none());
    let out = &history["out"][0];
    assert_eq!(out["txid"], tx_hash.as_str());
    assert_eq!(out["height"], 201);
    assert_eq!(out["fee"], sent["fee"]);
    assert_eq!(out["destinations"].as_array().unwrap().len(), 2);
}

#[test]
fn split_transfer_survives_repeated_oversize() {
    let mut service = service_with(tight_limits(3_000), RpcOptions::default());
    let address = primary_address(&mut service);
    let destinations = recipients(&address, 80, 1_000_000);

    // A plain transfer refuses to split.
    assert_eq!(
        call_err(&mut service, "transfer", json!({"destinations": destinations})),
        -4
    );

    let sent = call(
        &mut service,
        "transfer_split",
        json!({"destinations": destinations, "get_tx_keys": true}),
    );
    let hashes = sent["tx_hash_list"].as_array().unwrap();
    assert_eq!(hashes.len(), 2);
    assert_eq!(sent["tx_key_list"].as_array().unwrap().len(), 2);
    let total: u64 = sent["amount_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a.as_u64().unwrap())
        .sum();
    assert_eq!(total, 80 * 1_000_000);
    assert_eq!(service.rpc().wallet().unwrap().commit_count(), 2);

    let pending = call(&mut service, "get_transfers", json!({"pending": true}));
    assert_eq!(pending["pending"].as_array().unwrap().len(), 2);
}

#[test]
fn split_transfer_that_never_fits_is_too_big() {
    let mut service = service_with(tight_limits(500), RpcOptions::default());
    let address = primary_address(&mut service);
    let code = call_err(
        &mut service,
        "transfer_split",
        json!({"destinations": recipients(&address, 1, 1_000_000)}),
    );
    assert_eq!(code, -16);
    assert_eq!(service.rpc().wallet().unwrap().commit_count(), 0);
}

#[test]
fn retry_budget_is_configurable() {
    let options = RpcOptions {
        restricted: false,
        retry: RetryPolicy {
            max_attempts: 1,
            min_factor: 10,
        },
    };
    let mut service = service_with(tight_limits(3_000), options);
    let address = primary_address(&mut service);
    let code = call_err(
        &mut service,
        "transfer_split",
        json!({"destinations": recipients(&address, 80, 1_000_000)}),
    );
    assert_eq!(code, -16);
}

#[test]
fn integrated_destination_carries_its_payment_id() {
    let mut service = service();
    let integrated = call(
        &mut service,
        "make_integrated_address",
        json!({"payment_id": "00000000cafebabe"}),
    );
    let address = integrated["integrated_address"].as_str().unwrap();

    // An explicit id on top of the embedded one is refused.
    let code = call_err(
        &mut service,
        "transfer",
        json!({
            "destinations": recipients(address, 1, 1_000_000),
            "payment_id": "00000000cafebabe",
        }),
    );
    assert_eq!(code, -5);

    let sent = call(
        &mut service,
        "transfer",
        json!({"destinations": recipients(address, 1, 1_000_000)}),
    );
    let found = call(
        &mut service,
        "get_transfer_by_txid",
        json!({"txid": sent["tx_hash"]}),
    );
    assert_eq!(found["transfer"]["payment_id"], "00000000cafebabe");
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[test]
fn pool_is_only_read_when_asked_for() {
    let mut service = service();
    call(&mut service, "get_transfers", json!({"in": true}));
    assert_eq!(service.rpc().wallet().unwrap().pool_update_count(), 0);

    let history = call(&mut service, "get_transfers", json!({"pool": true}));
    assert_eq!(history["pool"][0]["amount"], 7_500_000_000u64);
    assert_eq!(history["pool"][0]["height"], 0);
    assert_eq!(service.rpc().wallet().unwrap().pool_update_count(), 1);

    // Once mined, the payment leaves the pool and shows up as incoming.
    service.refresh().unwrap();
    let history = call(&mut service, "get_transfers", json!({"in": true, "pool": true}));
    assert!(history.get("pool").is_none());
    let incoming = history["in"].as_array().unwrap();
    assert!(incoming.iter().any(|e| e["amount"] == 7_500_000_000u64 && e["height"] == 201));
}

#[test]
fn subaddress_scope_and_height_window() {
    let mut service = service();
    let history = call(
        &mut service,
        "get_transfers",
        json!({
            "in": true,
            "subaddr_indices": [1],
            "filter_by_height": true,
            "min_height": 15,
            "max_height": 40,
        }),
    );
    // Minor 1 received at heights 15, 30, 45 and 60.
    let heights: Vec<u64> = history["in"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["height"].as_u64().unwrap())
        .collect();
    assert_eq!(heights, vec![15, 30]);
}

#[test]
fn notes_show_up_in_history() {
    let mut service = service();
    let address = primary_address(&mut service);
    let sent = call(
        &mut service,
        "transfer",
        json!({"destinations": recipients(&address, 1, 2_000_000)}),
    );
    call(
        &mut service,
        "set_tx_notes",
        json!({"txids": [sent["tx_hash"]], "notes": ["coffee"]}),
    );
    let found = call(
        &mut service,
        "get_transfer_by_txid",
        json!({"txid": sent["tx_hash"]}),
    );
    assert_eq!(found["transfer"]["note"], "coffee");
}

// ---------------------------------------------------------------------------
// Service behavior
// ---------------------------------------------------------------------------

#[test]
fn restricted_mode_refuses_spending() {
    let options = RpcOptions {
        restricted: true,
        ..RpcOptions::default()
    };
    let mut service = service_with(MemoryWallet::dev(Network::Testnet), options);
    let address = primary_address(&mut service);

    for method in ["transfer", "transfer_split", "sweep_dust", "sweep_all", "get_transfers"] {
        let params = json!({"destinations": recipients(&address, 1, 1), "address": address});
        assert_eq!(call_err(&mut service, method, params), -7, "{method}");
    }
    assert_eq!(service.rpc().wallet().unwrap().commit_count(), 0);
    assert!(call(&mut service, "getbalance", json!({}))["balance"].as_u64().unwrap() > 0);
}

#[test]
fn stop_wallet_stores_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");
    let mut wallet = MemoryWallet::dev(Network::Testnet);
    wallet.set_path(path.clone());
    let mut service = service_with(wallet, RpcOptions::default());

    call(&mut service, "create_account", json!({"label": "travel"}));
    call(&mut service, "stop_wallet", json!({}));
    assert!(service.stop_requested());

    let reopened = MemoryWallet::open(&path).unwrap();
    assert_eq!(reopened.num_accounts(), 2);
    assert_eq!(reopened.height(), 200);
}

#[test]
fn payment_uri_feeds_a_transfer_and_the_address_book_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");
    let mut wallet = MemoryWallet::dev(Network::Testnet);
    wallet.set_path(path.clone());
    let mut service = service_with(wallet, RpcOptions::default());
    let savings = call(&mut service, "getaddress", json!({}))["addresses"][1]["address"]
        .as_str()
        .unwrap()
        .to_string();

    let made = call(
        &mut service,
        "make_uri",
        json!({"address": &savings, "amount": 2_500_000_000u64, "recipient_name": "Savings jar"}),
    );
    let parsed = call(&mut service, "parse_uri", json!({"uri": made["uri"]}));
    assert_eq!(parsed["uri"]["recipient_name"], "Savings jar");
    assert_eq!(parsed["unknown_parameters"], json!([]));

    let request = &parsed["uri"];
    let sent = call(
        &mut service,
        "transfer",
        json!({"destinations": [{"address": request["address"], "amount": request["amount"]}]}),
    );
    let pending = call(&mut service, "get_transfer_by_txid", json!({"txid": sent["tx_hash"]}));
    assert_eq!(pending["transfer"]["amount"], 2_500_000_000u64);

    let added = call(
        &mut service,
        "add_address_book",
        json!({"address": &savings, "description": "jar"}),
    );
    assert_eq!(added["index"], 0);
    call(&mut service, "store", json!({}));

    let reopened = MemoryWallet::open(&path).unwrap();
    assert_eq!(reopened.address_book().len(), 1);
    assert_eq!(reopened.address_book()[0].description, "jar");
    assert!(reopened.address_book()[0].is_subaddress);
}

#[test]
fn envelope_errors() {
    let mut service = service();
    let mut bad_version = envelope("getheight", json!({}));
    bad_version.jsonrpc = "1.0".into();
    assert_eq!(service.handle(bad_version).error.unwrap().code, -32600);

    assert_eq!(call_err(&mut service, "no_such_method", json!({})), -32601);
    assert_eq!(
        call_err(&mut service, "getbalance", json!({"account_index": "zero"})),
        -32602
    );
}
