//! Proxy-wallet batch call data

use ethers::types::Bytes;
use ethers::utils::id;

use super::words::{encode_address, encode_uint256, encode_uint8, encode_usize, pad_right};
use super::{EncodeError, Result};
use crate::domain::ProxyCall;

pub const PROXY_BATCH_SIGNATURE: &str = "proxy((uint8,address,uint256,bytes)[])";

/// Head words of one `(uint8,address,uint256,bytes)` tuple.
const TUPLE_HEAD_LEN: usize = 4 * 32;

/// Encode `proxy(calls)` on the proxy wallet factory.
///
/// Layout: selector, array offset (0x20), length, one offset word per tuple
/// (relative to the first offset word), then each tuple's head
/// `typeCode ‖ to ‖ value ‖ 0x80` followed by its data length and padded data.
pub fn encode_proxy_batch(calls: &[ProxyCall]) -> Result<Bytes> {
    if calls.is_empty() {
        return Err(EncodeError::Empty("proxy call batch"));
    }

    let tuples: Vec<Vec<u8>> = calls.iter().map(encode_tuple).collect();
    let body_len: usize = tuples.iter().map(Vec::len).sum();

    let mut out = Vec::with_capacity(4 + 64 + 32 * calls.len() + body_len);
    out.extend_from_slice(&id(PROXY_BATCH_SIGNATURE));
    out.extend_from_slice(&encode_usize(0x20));
    out.extend_from_slice(&encode_usize(calls.len()));

    let mut offset = 32 * calls.len();
    for tuple in &tuples {
        out.extend_from_slice(&encode_usize(offset));
        offset += tuple.len();
    }
    for tuple in tuples {
        out.extend_from_slice(&tuple);
    }

    Ok(out.into())
}

fn encode_tuple(call: &ProxyCall) -> Vec<u8> {
    let data = pad_right(&call.data);
    let mut out = Vec::with_capacity(TUPLE_HEAD_LEN + 32 + data.len());
    out.extend_from_slice(&encode_uint8(call.call_type.code()));
    out.extend_from_slice(&encode_address(call.to));
    out.extend_from_slice(&encode_uint256(call.value));
    out.extend_from_slice(&encode_usize(TUPLE_HEAD_LEN));
    out.extend_from_slice(&encode_usize(call.data.len()));
    out.extend_from_slice(&data);
    out
}
