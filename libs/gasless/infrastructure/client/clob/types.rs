//! CLOB API response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::TickSize;

/// Per-order entry of the `POST /orders` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPostResult {
    #[serde(default)]
    pub success: bool,

    #[serde(rename = "errorMsg", default)]
    pub error_msg: String,

    #[serde(rename = "orderID", default)]
    pub order_id: String,

    /// "matched", "live", "delayed", "unmatched"
    #[serde(default)]
    pub status: String,

    #[serde(rename = "makingAmount", default)]
    pub making_amount: String,

    #[serde(rename = "takingAmount", default)]
    pub taking_amount: String,

    #[serde(rename = "transactionsHashes", default)]
    pub transactions_hashes: Vec<String>,
}

impl OrderPostResult {
    /// The exchange reports some rejections with `success: true` and an error text.
    pub fn is_accepted(&self) -> bool {
        self.success && self.error_msg.is_empty()
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error_msg: message.into(),
            ..Self::default()
        }
    }
}

/// `GET /tick-size` response. The exchange sends the tick as a number.
#[derive(Debug, Clone, Deserialize)]
pub struct TickSizeResponse {
    pub minimum_tick_size: Value,
}

impl TickSizeResponse {
    pub fn tick_size(&self) -> Option<TickSize> {
        match &self.minimum_tick_size {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.to_string().parse().ok(),
            _ => None,
        }
    }
}

/// `GET /neg-risk` response
#[derive(Debug, Clone, Deserialize)]
pub struct NegRiskResponse {
    /// Whether the token trades on the neg-risk exchange
    pub neg_risk: bool,
}

/// Tick size used for an order and whether it came from the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSizeResolution {
    pub tick: TickSize,
    pub fallback: bool,
}
