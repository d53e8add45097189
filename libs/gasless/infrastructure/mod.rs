//! Infrastructure Layer
//!
//! Implementations of external interfaces: signing, chain RPC, call
//! encoding, the relay pipeline, the CLOB client and configuration.
//! This layer depends on the domain layer but not on the application layer.

pub mod chain;
pub mod client;
pub mod config;
pub mod encoding;
pub mod logging;
pub mod observability;
pub mod relay;
pub mod signer;

pub use chain::{ChainGateway, GatewayError, HttpEndpoint, RpcEndpoint};
pub use client::{ApiAuth, ApiCredentials, AuthError, RestClient, RestError};
pub use config::{ConfigError, ContractAddresses, GaslessConfig};
pub use encoding::EncodeError;
pub use logging::init_tracing;
pub use observability::Observability;
pub use relay::{BuildError, PollError, RelayClient, RelayError, TransactionBuilder};
pub use signer::{Signer, SignerError};
