//! Hand-laid call data with literal selectors
//!
//! These layouts are fixed by the deployed contracts; the selectors are
//! protocol constants and are never re-derived from a signature string.

use ethers::types::{Address, Bytes, H256, U256};

use super::words::{encode_address, encode_uint256, encode_usize};
use super::{EncodeError, Result};

/// Neg-risk adapter `redeemPositions(bytes32,uint256[])`.
pub const NEG_RISK_REDEEM_SELECTOR: [u8; 4] = [0xdb, 0xec, 0xcb, 0x23];

/// `splitPosition(address,bytes32,bytes32,uint256[],uint256)`
pub const SPLIT_POSITION_SELECTOR: [u8; 4] = [0x72, 0xce, 0x42, 0x75];

/// `mergePositions(address,bytes32,bytes32,uint256[],uint256)`
pub const MERGE_POSITIONS_SELECTOR: [u8; 4] = [0x9e, 0x72, 0x12, 0xad];

/// `selector ‖ conditionId ‖ 0x40 ‖ len ‖ amount words`
///
/// `amounts` is one entry per outcome; at least one must be non-zero.
pub fn encode_redeem_neg_risk(condition_id: H256, amounts: &[U256]) -> Result<Bytes> {
    if amounts.is_empty() {
        return Err(EncodeError::Empty("neg-risk redeem amount list"));
    }
    if amounts.iter().all(|amount| amount.is_zero()) {
        return Err(EncodeError::InvalidAmount(
            "neg-risk redeem needs at least one non-zero amount".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(4 + 32 * (3 + amounts.len()));
    out.extend_from_slice(&NEG_RISK_REDEEM_SELECTOR);
    out.extend_from_slice(condition_id.as_bytes());
    out.extend_from_slice(&encode_usize(0x40));
    out.extend_from_slice(&encode_usize(amounts.len()));
    for amount in amounts {
        out.extend_from_slice(&encode_uint256(*amount));
    }

    Ok(out.into())
}

pub fn encode_split_position(
    collateral: Address,
    condition_id: H256,
    partition: &[U256],
    amount: U256,
) -> Result<Bytes> {
    encode_partition_call(SPLIT_POSITION_SELECTOR, collateral, condition_id, partition, amount)
}

pub fn encode_merge_positions(
    collateral: Address,
    condition_id: H256,
    partition: &[U256],
    amount: U256,
) -> Result<Bytes> {
    encode_partition_call(MERGE_POSITIONS_SELECTOR, collateral, condition_id, partition, amount)
}

/// `collateral ‖ parent(0) ‖ conditionId ‖ 0xa0 ‖ amount ‖ len ‖ partition…`
///
/// The amount word sits right after the array offset; the array body
/// follows the five head words.
fn encode_partition_call(
    selector: [u8; 4],
    collateral: Address,
    condition_id: H256,
    partition: &[U256],
    amount: U256,
) -> Result<Bytes> {
    if partition.is_empty() {
        return Err(EncodeError::Empty("partition"));
    }
    if amount.is_zero() {
        return Err(EncodeError::InvalidAmount("amount must be positive".to_string()));
    }

    let mut out = Vec::with_capacity(4 + 32 * (6 + partition.len()));
    out.extend_from_slice(&selector);
    out.extend_from_slice(&encode_address(collateral));
    out.extend_from_slice(&[0u8; 32]);
    out.extend_from_slice(condition_id.as_bytes());
    out.extend_from_slice(&encode_usize(0xa0));
    out.extend_from_slice(&encode_uint256(amount));
    out.extend_from_slice(&encode_usize(partition.len()));
    for index_set in partition {
        out.extend_from_slice(&encode_uint256(*index_set));
    }

    Ok(out.into())
}
