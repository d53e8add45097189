//! Domain Layer
//!
//! Pure value types for the relay pipeline and the order engine.
//! No network or signing dependencies live here.

pub mod calls;
pub mod models;
pub mod order;

pub use calls::{OperationType, ProxyCall, ProxyCallType, SafeCall};
pub use models::{parse_address, parse_hash, DomainError, RelayWalletType, Result, SignatureType};
pub use order::{OrderType, RoundConfig, Side, TickSize};
