//! Live tests against the public relay, CLOB and Polygon RPCs
//!
//! These need network access and real credentials. They are marked
//! #[ignore] and should be run explicitly:
//!
//! ```bash
//! export PRIVATE_KEY="0x..."
//! export BUILDER_API_KEY="..." BUILDER_SECRET="..." BUILDER_PASSPHRASE="..."
//! cargo test -p gasless --test live_relay -- --ignored
//! ```

mod common;

use gasless::domain::{RelayWalletType, TickSize};
use gasless::infrastructure::client::clob::constants::DEFAULT_CLOB_URL;
use gasless::infrastructure::config::default_rpc_urls;
use gasless::infrastructure::relay::{RelayClient, RetryPolicy, DEFAULT_RELAYER_URL};
use gasless::infrastructure::{ApiAuth, ChainGateway, Observability, RestClient, Signer};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
#[ignore]
async fn test_relay_nonce_for_test_key() {
    let signer = Signer::new(common::TEST_KEY, 137).unwrap();
    let relay = RelayClient::new(DEFAULT_RELAYER_URL, None, RetryPolicy::default()).unwrap();

    let nonce = relay.get_relay_nonce(signer.address(), RelayWalletType::Proxy).await.unwrap();
    verbose_println!("proxy nonce for {:?}: {}", signer.address(), nonce);
}

#[tokio::test]
#[ignore]
async fn test_public_rpc_pool_answers() {
    let gateway = ChainGateway::connect(&default_rpc_urls(137), Duration::from_secs(10), Observability::new("live"))
        .unwrap();
    let balance = gateway.balance_at(ethers::types::Address::zero(), None).await.unwrap();
    verbose_println!("zero address balance: {}", balance);
}

#[tokio::test]
#[ignore]
async fn test_tick_size_lookup() {
    let _ = dotenv::dotenv();
    let signer = Arc::new(Signer::new(common::TEST_KEY, 137).unwrap());
    let rest = RestClient::new(DEFAULT_CLOB_URL, ApiAuth::new(signer, 137), RetryPolicy::default()).unwrap();

    let token = std::env::var("TEST_TOKEN_ID").unwrap_or_else(|_| {
        "87681536460342357667165150330318852851476971055929009934844581402585803923513".to_string()
    });
    let resolution = rest.resolve_tick_size(&token, None, TickSize::Hundredth).await;
    verbose_println!("tick size for {}: {:?}", token, resolution);
}

#[tokio::test]
#[ignore]
async fn test_builder_credentials_accepted() {
    skip_if_no_credentials!();
    let _ = dotenv::dotenv();

    let mut config = gasless::GaslessConfig::from_yaml_str("{}").unwrap();
    config.apply_env_with(|name| std::env::var(name).ok());
    config.validate().unwrap();

    let relay = RelayClient::new(
        config.relay.url.clone(),
        config.builder_credentials.clone(),
        config.nonce_retry_policy(),
    )
    .unwrap();
    assert!(relay.has_credentials());
}
