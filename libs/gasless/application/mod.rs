//! Application Layer
//!
//! `ClientContext` holds the shared state; `PositionActions` and
//! `OrderActions` are the capabilities built on it.
//! This layer depends on domain and infrastructure layers.

pub mod context;
pub mod error;
pub mod facade;
pub mod orders;
pub mod positions;

pub use context::ClientContext;
pub use error::{GaslessError, Result};
pub use facade::GaslessClient;
pub use orders::OrderActions;
pub use positions::{PositionAction, PositionActions, RelayExecution};
