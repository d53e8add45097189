//! Offline integration tests for the relay pipeline's public surface
//!
//! Run with: cargo test -p gasless --test relay_pipeline

mod common;

use common::{ScriptedEndpoint, TEST_KEY};
use ethers::types::{Address, H256, U256};
use gasless::domain::{ProxyCall, SafeCall};
use gasless::infrastructure::config::ContractAddresses;
use gasless::infrastructure::encoding::{encode_proxy_batch, encode_redeem_neg_risk, encode_redeem_positions};
use gasless::infrastructure::relay::{
    adjust_safe_signature, derive_proxy_wallet, derive_safe_wallet, to_spaced_json, ProxyTransaction,
};
use gasless::infrastructure::{ChainGateway, Observability, RpcEndpoint, Signer};
use std::sync::Arc;
use std::time::Duration;

fn mainnet() -> ContractAddresses {
    ContractAddresses::for_chain(137).unwrap()
}

#[tokio::test]
async fn test_gateway_fails_over_past_rate_limits() {
    let limited_a = Arc::new(ScriptedEndpoint::failing("a", "429 Too Many Requests"));
    let limited_b = Arc::new(ScriptedEndpoint::failing("b", "rate limit exceeded"));
    let healthy = Arc::new(ScriptedEndpoint::healthy("c", 42));

    let endpoints: Vec<Arc<dyn RpcEndpoint>> = vec![limited_a.clone(), limited_b.clone(), healthy.clone()];
    let observability = Observability::new("integration");
    let gateway = ChainGateway::from_endpoints(endpoints, Duration::from_secs(1), observability.clone()).unwrap();

    let balance = gateway.balance_at(Address::zero(), None).await.unwrap();
    verbose_println!("balance {} after {} rpc calls", balance, observability.rpc_calls());

    assert_eq!(balance, U256::from(42));
    assert_eq!((limited_a.hits(), limited_b.hits(), healthy.hits()), (1, 1, 1));
    assert_eq!(observability.rpc_calls(), 3);
}

#[tokio::test]
async fn test_gateway_reports_last_error_when_exhausted() {
    let endpoints: Vec<Arc<dyn RpcEndpoint>> = vec![
        Arc::new(ScriptedEndpoint::failing("a", "connection reset")),
        Arc::new(ScriptedEndpoint::failing("b", "request timed out")),
    ];
    let gateway = ChainGateway::from_endpoints(endpoints, Duration::from_secs(1), Observability::default()).unwrap();

    let err = gateway.balance_at(Address::zero(), None).await.unwrap_err();
    assert!(err.to_string().starts_with("all RPC nodes failed: "));
}

#[test]
fn test_wallet_derivation_for_known_owner() {
    let signer = Signer::new(TEST_KEY, 137).unwrap();
    let contracts = mainnet();

    let proxy = derive_proxy_wallet(signer.address(), contracts.proxy_factory);
    let safe = derive_safe_wallet(signer.address(), contracts.safe_factory);

    assert_eq!(format!("{:?}", proxy), "0x8e74c460218c0292df3bbe7a17636c7bfc806cd2");
    assert_eq!(format!("{:?}", safe), "0x1b861deae99d06fdf97e22b64365ea3c591f27ca");
}

#[test]
fn test_proxy_struct_wraps_encoded_batch() {
    let contracts = mainnet();
    let redeem = encode_redeem_positions(contracts.collateral, H256::repeat_byte(7), &[U256::from(1), U256::from(2)]);
    let data = encode_proxy_batch(&[ProxyCall::call(contracts.ctf, redeem)]).unwrap();

    let tx = ProxyTransaction {
        from: Address::repeat_byte(1),
        to: contracts.proxy_factory,
        data: data.clone(),
        relayer_fee: U256::zero(),
        gas_price: U256::zero(),
        gas_limit: U256::from(10_000_000u64),
        nonce: U256::from(3),
        relay_hub: contracts.relay_hub,
        relay: Address::repeat_byte(2),
    };

    let bytes = tx.struct_bytes();
    assert_eq!(&bytes[..4], b"rlx:");
    assert_eq!(bytes.len(), 4 + 20 + 20 + data.len() + 4 * 32 + 40);
}

#[test]
fn test_neg_risk_redeem_layout() {
    let data = encode_redeem_neg_risk(H256::repeat_byte(0xaa), &[U256::from(10), U256::from(20), U256::zero()]).unwrap();
    assert_eq!(hex::encode(&data[..4]), "dbeccb23");
    assert_eq!(data.len(), 4 + 32 * 6);
    assert_eq!(data[4 + 32 + 31], 0x40);
    assert_eq!(data[4 + 64 + 31], 3);
}

#[test]
fn test_safe_signature_adjustment_from_real_signer() {
    let signer = Signer::new(TEST_KEY, 137).unwrap();
    for seed in 0u8..8 {
        let signature = signer.sign_recoverable(H256::repeat_byte(seed)).unwrap();
        assert!(signature[64] == 27 || signature[64] == 28);
        let adjusted = adjust_safe_signature(signature);
        assert_eq!(adjusted[64], signature[64] + 4);
        assert_eq!(adjusted[..64], signature[..64]);
    }
}

#[test]
fn test_spaced_json_matches_relay_format() {
    let value = serde_json::json!({"a": 1, "b": [1, 2]});
    assert_eq!(to_spaced_json(&value).unwrap(), r#"{"a": 1, "b": [1, 2]}"#);
}

#[test]
fn test_single_safe_call_is_not_wrapped() {
    let call = SafeCall::call(mainnet().ctf, vec![0xde, 0xad].into());
    let aggregated = gasless::infrastructure::encoding::aggregate_safe_calls(&[call.clone()], mainnet().multisend).unwrap();
    assert_eq!(aggregated, call);
}
