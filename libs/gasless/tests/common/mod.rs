//! Shared helpers for gasless integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ethers::providers::ProviderError;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockId, Bytes, Transaction, TransactionReceipt, H256, U256};
use gasless::infrastructure::RpcEndpoint;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed test key; never funded.
pub const TEST_KEY: &str = "0x257091039adf0d3df1f3171508f7db838782ee9b4f6ad61054be773e7541d90a";

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Check if the variables needed by live relay tests are set
pub fn has_relay_credentials() -> bool {
    ["PRIVATE_KEY", "BUILDER_API_KEY", "BUILDER_SECRET", "BUILDER_PASSPHRASE"]
        .iter()
        .all(|name| std::env::var(name).is_ok())
}

/// Skip test if credentials are not available
#[macro_export]
macro_rules! skip_if_no_credentials {
    () => {
        if !$crate::common::has_relay_credentials() {
            println!("Skipping test: relay credentials not available");
            return;
        }
    };
}

/// Endpoint that answers every call with one canned error or balance.
pub struct ScriptedEndpoint {
    url: String,
    error: Option<String>,
    balance: U256,
    hits: AtomicUsize,
}

impl ScriptedEndpoint {
    pub fn failing(url: &str, error: &str) -> Self {
        Self {
            url: url.to_string(),
            error: Some(error.to_string()),
            balance: U256::zero(),
            hits: AtomicUsize::new(0),
        }
    }

    pub fn healthy(url: &str, balance: u64) -> Self {
        Self {
            url: url.to_string(),
            error: None,
            balance: U256::from(balance),
            hits: AtomicUsize::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn answer<T>(&self, value: T) -> Result<T, ProviderError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(message) => Err(ProviderError::CustomError(message.clone())),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl RpcEndpoint for ScriptedEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, _tx: &TypedTransaction, _block: Option<BlockId>) -> Result<Bytes, ProviderError> {
        self.answer(Bytes::default())
    }

    async fn balance(&self, _address: Address, _block: Option<BlockId>) -> Result<U256, ProviderError> {
        self.answer(self.balance)
    }

    async fn estimate_gas(&self, _tx: &TypedTransaction) -> Result<U256, ProviderError> {
        self.answer(U256::from(21_000u64))
    }

    async fn receipt(&self, _hash: H256) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.answer(None)
    }

    async fn transaction(&self, _hash: H256) -> Result<Option<Transaction>, ProviderError> {
        self.answer(None)
    }
}
