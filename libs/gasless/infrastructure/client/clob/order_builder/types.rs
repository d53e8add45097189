//! Order types and error definitions

use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use thiserror::Error;

use crate::domain::{OrderType, Side, SignatureType, TickSize};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderBuilderError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Invalid token ID: {0}")]
    InvalidTokenId(String),

    #[error("Failed to sign order: {0}")]
    SigningError(String),
}

pub type Result<T> = std::result::Result<T, OrderBuilderError>;

/// What the caller wants to trade.
///
/// `tick_size` and `neg_risk` are looked up from the CLOB when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderArgs {
    pub token_id: String,
    pub price: Decimal,
    pub size: Decimal,
    pub side: Side,
    #[serde(default = "default_order_type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub fee_rate_bps: u64,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub expiration: u64,
    #[serde(default)]
    pub tick_size: Option<TickSize>,
    #[serde(default)]
    pub neg_risk: Option<bool>,
}

fn default_order_type() -> OrderType {
    OrderType::GTC
}

impl OrderArgs {
    pub fn new(token_id: impl Into<String>, price: Decimal, size: Decimal, side: Side) -> Self {
        Self {
            token_id: token_id.into(),
            price,
            size,
            side,
            order_type: OrderType::GTC,
            fee_rate_bps: 0,
            nonce: 0,
            expiration: 0,
            tick_size: None,
            neg_risk: None,
        }
    }
}

/// CTF Exchange Order matching the on-chain EIP-712 struct
///
/// Field order and types must match exactly:
/// ```solidity
/// struct Order {
///     uint256 salt;
///     address maker;
///     address signer;
///     address taker;
///     uint256 tokenId;
///     uint256 makerAmount;
///     uint256 takerAmount;
///     uint256 expiration;
///     uint256 nonce;
///     uint256 feeRateBps;
///     uint8 side;
///     uint8 signatureType;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub salt: U256,
    /// Funder address (proxy wallet or Safe in relay modes)
    pub maker: Address,
    pub signer: Address,
    /// Zero address for public orders
    pub taker: Address,
    pub token_id: U256,
    pub maker_amount: U256,
    pub taker_amount: U256,
    pub expiration: U256,
    pub nonce: U256,
    pub fee_rate_bps: U256,
    pub side: Side,
    pub signature_type: SignatureType,
}

/// Signed order ready for API submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder {
    pub order: Order,
    pub signature: String,
    /// Exchange whose domain the signature was made under
    pub neg_risk: bool,
}

impl SignedOrder {
    /// Wire form of the order for `POST /orders`.
    ///
    /// Keys keep struct order. `salt` and `signatureType` are JSON integers
    /// (the salt through `arbitrary_precision`); other numbers are decimal
    /// strings and addresses are checksummed.
    pub fn to_api_json(&self) -> Value {
        let order = &self.order;
        let decimal = |value: U256| Value::String(value.to_string());

        json!({
            "salt": Value::Number(Number::from_string_unchecked(order.salt.to_string())),
            "maker": to_checksum(&order.maker, None),
            "signer": to_checksum(&order.signer, None),
            "taker": to_checksum(&order.taker, None),
            "tokenId": decimal(order.token_id),
            "makerAmount": decimal(order.maker_amount),
            "takerAmount": decimal(order.taker_amount),
            "expiration": decimal(order.expiration),
            "nonce": decimal(order.nonce),
            "feeRateBps": decimal(order.fee_rate_bps),
            "side": order.side.as_str(),
            "signatureType": order.signature_type.code(),
            "signature": self.signature,
        })
    }
}
