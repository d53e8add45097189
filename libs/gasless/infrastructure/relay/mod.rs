//! Gasless relay pipeline
//!
//! Build → sign → submit → poll. `builder` produces signed envelopes,
//! `client` talks to the relay, `poller` follows the result on-chain.

pub mod builder;
pub mod client;
pub mod json;
pub mod poller;
pub mod retry;
pub mod types;
pub mod wallet;

pub use builder::{
    adjust_safe_signature, BuildError, BuilderSettings, GasLimit, GasLimitSource, ProxyTransaction,
    TransactionBuilder, DEFAULT_PROXY_GAS_LIMIT,
};
pub use client::{interpret_response, parse_nonce, RelayClient, RelayError, DEFAULT_RELAYER_URL};
pub use json::to_spaced_json;
pub use poller::{diagnose_revert, wait_for_receipt, PollError, PollSettings};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use types::{
    ProxyRelayBody, RelayEnvelope, RelayOutcome, RelayPayload, RelayState, RelayTransaction,
    SafeRelayBody,
};
pub use wallet::{
    derive_proxy_wallet, derive_safe_wallet, resolve_safe_wallet, WalletResolution, WalletSource,
};
