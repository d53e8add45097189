//! Polymarket gasless relay client
//!
//! Builds, signs and relays proxy-wallet and Safe transactions (redeem,
//! split, merge) and places CLOB orders in authenticated batches.
//!
//! - `domain`: value types shared by every layer
//! - `infrastructure`: signer, RPC gateway, encoders, relay and CLOB clients
//! - `application`: `ClientContext` plus the position and order capabilities

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{ClientContext, GaslessClient, GaslessError, OrderActions, PositionActions};
pub use domain::{OrderType, Side, SignatureType, TickSize};
pub use infrastructure::{init_tracing, GaslessConfig};
