//! Application Facade
//!
//! Public API for binaries (presentation layer): one call from a loaded
//! configuration to ready-to-use capabilities.

use std::sync::Arc;

use super::{ClientContext, OrderActions, PositionActions, Result};
use crate::infrastructure::{init_tracing, GaslessConfig, Observability};

pub struct GaslessClient {
    pub context: Arc<ClientContext>,
    pub positions: PositionActions,
    pub orders: OrderActions,
}

impl GaslessClient {
    /// Initialize logging from the config, connect, and resolve the wallet.
    pub async fn connect(config: GaslessConfig, name: &str) -> Result<Self> {
        init_tracing(&config.log_level);
        config.log();

        let context = Arc::new(ClientContext::connect(config, Observability::new(name)).await?);
        let positions = PositionActions::new(context.clone());
        let orders = OrderActions::new(context.clone())?;

        Ok(Self {
            context,
            positions,
            orders,
        })
    }
}
