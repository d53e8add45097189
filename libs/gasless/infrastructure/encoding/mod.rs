//! Call data encoders for the fixed set of contracts the relay pipeline touches.
//!
//! - `abi`: standard ABI packing through abigen-generated call structs
//! - `manual`: hand-laid layouts with literal selectors (neg-risk redeem, split, merge)
//! - `proxy`: proxy-wallet `proxy((uint8,address,uint256,bytes)[])` batches
//! - `multisend`: Safe `multiSend(bytes)` aggregation
//! - `words`: 32-byte word helpers shared with EIP-712 hashing

pub mod abi;
pub mod manual;
pub mod multisend;
pub mod proxy;
pub mod words;

use thiserror::Error;

pub use abi::{
    decode_address_word, decode_bytes32, decode_uint, encode_balance_of, encode_compute_proxy_address,
    encode_erc20_approve, encode_get_transaction_hash, encode_redeem_positions,
    encode_set_approval_for_all, BINARY_INDEX_SETS,
};
pub use manual::{
    encode_merge_positions, encode_redeem_neg_risk, encode_split_position,
    MERGE_POSITIONS_SELECTOR, NEG_RISK_REDEEM_SELECTOR, SPLIT_POSITION_SELECTOR,
};
pub use multisend::{aggregate_safe_calls, MULTISEND_SELECTOR};
pub use proxy::{encode_proxy_batch, PROXY_BATCH_SIGNATURE};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Cannot encode an empty {0}")]
    Empty(&'static str),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Malformed return data: {0}")]
    MalformedReturn(String),
}

pub type Result<T> = std::result::Result<T, EncodeError>;
