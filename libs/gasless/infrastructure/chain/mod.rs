//! Chain access: a pool of JSON-RPC endpoints behind one failover gateway.

pub mod endpoint;
pub mod gateway;

pub use endpoint::{HttpEndpoint, RpcEndpoint};
pub use gateway::{is_retryable_error, ChainGateway, GatewayError, Result};
