//! CLOB (Central Limit Order Book) order placement
//!
//! EIP-712 order signing, tick-dependent amount rounding, L1/L2
//! authenticated REST calls and the chunked batch engine.

pub mod batch;
pub mod constants;
mod helpers;
pub mod order_builder;
pub mod rest;
pub mod types;

pub use batch::{submit_orders, BatchReport, OrderResult, OrderTransport, PreparedOrder};
pub use order_builder::{ExchangeAddresses, OrderArgs, OrderBuilder, OrderBuilderError, SignedOrder};
pub use rest::{RestClient, RestError};
pub use types::{OrderPostResult, TickSizeResolution};
