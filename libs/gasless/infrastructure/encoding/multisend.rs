//! Safe multiSend aggregation

use ethers::abi::{encode, Token};
use ethers::types::{Address, U256};

use super::words::encode_uint256;
use super::{EncodeError, Result};
use crate::domain::{OperationType, SafeCall};

/// keccak256("multiSend(bytes)")[..4]
pub const MULTISEND_SELECTOR: [u8; 4] = [0x8d, 0x80, 0xff, 0x0a];

/// `operation(1) ‖ to(20) ‖ value(32) ‖ len(32) ‖ data`
fn pack_call(call: &SafeCall, out: &mut Vec<u8>) {
    out.push(call.operation.code());
    out.extend_from_slice(call.to.as_bytes());
    out.extend_from_slice(&encode_uint256(call.value));
    out.extend_from_slice(&encode_uint256(U256::from(call.data.len())));
    out.extend_from_slice(&call.data);
}

/// Collapse a list of Safe calls into the one call the Safe executes.
///
/// A single call passes through unchanged. Several calls become a
/// DelegateCall to the multiSend contract carrying their packed concatenation.
pub fn aggregate_safe_calls(calls: &[SafeCall], multisend: Address) -> Result<SafeCall> {
    match calls {
        [] => Err(EncodeError::Empty("safe call batch")),
        [single] => Ok(single.clone()),
        many => {
            let mut packed = Vec::new();
            for call in many {
                pack_call(call, &mut packed);
            }

            let mut data = MULTISEND_SELECTOR.to_vec();
            data.extend(encode(&[Token::Bytes(packed)]));

            Ok(SafeCall {
                to: multisend,
                data: data.into(),
                operation: OperationType::DelegateCall,
                value: U256::zero(),
            })
        }
    }
}
