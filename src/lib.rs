//! Polymarket Gasless Client - Main Library
//!
//! Relayed position management (redeem, split, merge) and signed CLOB order
//! batches for Polymarket proxy and Safe wallets.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, config loading)
//! - **gasless**: Core library (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,no_run
//! use polymarket_gasless::bin_common::{load_config, ConfigType};
//! use polymarket_gasless::gasless::GaslessClient;
//! ```

// Re-export workspace libraries for convenience
pub use gasless;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{load_config, load_config_from_env, parse_args, ConfigType};
}
