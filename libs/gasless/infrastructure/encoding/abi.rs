//! Standard ABI call data
//!
//! Functions whose parameters follow the Solidity ABI in declaration order
//! go through abigen-generated call structs.

use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, H256, U256};

use super::{EncodeError, Result};
use crate::domain::OperationType;

mod ctf {
    ethers::contract::abigen!(
        ConditionalTokens,
        r#"[
            function redeemPositions(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] indexSets) external
            function splitPosition(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] partition, uint256 amount) external
            function mergePositions(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] partition, uint256 amount) external
            function balanceOf(address account, uint256 id) external view returns (uint256)
            function setApprovalForAll(address operator, bool approved) external
        ]"#
    );
}

mod safe {
    ethers::contract::abigen!(
        GnosisSafe,
        r#"[
            function getTransactionHash(address to, uint256 value, bytes data, uint8 operation, uint256 safeTxGas, uint256 baseGas, uint256 gasPrice, address gasToken, address refundReceiver, uint256 nonce) external view returns (bytes32)
        ]"#
    );
}

mod factory {
    ethers::contract::abigen!(
        SafeProxyFactory,
        r#"[
            function computeProxyAddress(address user) external view returns (address)
        ]"#
    );
}

mod erc20 {
    ethers::contract::abigen!(
        Erc20,
        r#"[
            function approve(address spender, uint256 amount) external returns (bool)
        ]"#
    );
}

#[cfg(test)]
pub(crate) use ctf::{MergePositionsCall, SplitPositionCall};

/// Index sets for the two outcomes of a binary condition.
pub const BINARY_INDEX_SETS: [u64; 2] = [1, 2];

/// `redeemPositions(collateral, 0x0, conditionId, indexSets)` on the conditional-tokens contract.
pub fn encode_redeem_positions(collateral: Address, condition_id: H256, index_sets: &[U256]) -> Bytes {
    ctf::RedeemPositionsCall {
        collateral_token: collateral,
        parent_collection_id: [0u8; 32],
        condition_id: condition_id.0,
        index_sets: index_sets.to_vec(),
    }
    .encode()
    .into()
}

/// ERC1155 `balanceOf(account, id)`.
pub fn encode_balance_of(account: Address, token_id: U256) -> Bytes {
    ctf::BalanceOfCall {
        account,
        id: token_id,
    }
    .encode()
    .into()
}

pub fn encode_set_approval_for_all(operator: Address, approved: bool) -> Bytes {
    ctf::SetApprovalForAllCall { operator, approved }.encode().into()
}

pub fn encode_erc20_approve(spender: Address, amount: U256) -> Bytes {
    erc20::ApproveCall { spender, amount }.encode().into()
}

/// Safe `getTransactionHash` with the gas and refund fields zeroed.
pub fn encode_get_transaction_hash(
    to: Address,
    value: U256,
    data: Bytes,
    operation: OperationType,
    nonce: U256,
) -> Bytes {
    safe::GetTransactionHashCall {
        to,
        value,
        data,
        operation: operation.code(),
        safe_tx_gas: U256::zero(),
        base_gas: U256::zero(),
        gas_price: U256::zero(),
        gas_token: Address::zero(),
        refund_receiver: Address::zero(),
        nonce,
    }
    .encode()
    .into()
}

/// Safe factory `computeProxyAddress(owner)`.
pub fn encode_compute_proxy_address(owner: Address) -> Bytes {
    factory::ComputeProxyAddressCall { user: owner }.encode().into()
}

fn first_word(data: &[u8]) -> Result<&[u8]> {
    data.get(..32).ok_or_else(|| {
        EncodeError::MalformedReturn(format!("expected at least 32 bytes, got {}", data.len()))
    })
}

pub fn decode_bytes32(data: &[u8]) -> Result<H256> {
    first_word(data).map(H256::from_slice)
}

pub fn decode_address_word(data: &[u8]) -> Result<Address> {
    first_word(data).map(|word| Address::from_slice(&word[12..]))
}

pub fn decode_uint(data: &[u8]) -> Result<U256> {
    first_word(data).map(U256::from_big_endian)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition() -> H256 {
        H256::from_low_u64_be(0xabcdef)
    }

    #[test]
    fn test_redeem_positions_layout() {
        let collateral: Address = "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174".parse().unwrap();
        let data = encode_redeem_positions(
            collateral,
            condition(),
            &BINARY_INDEX_SETS.map(U256::from),
        );

        assert_eq!(hex::encode(&data[..4]), "01b7037c");
        // selector + 4 head words + length + 2 elements
        assert_eq!(data.len(), 4 + 32 * 7);
        assert_eq!(&data[4 + 12..4 + 32], collateral.as_bytes());
        assert_eq!(&data[4 + 64..4 + 96], condition().as_bytes());
        assert_eq!(U256::from_big_endian(&data[4 + 96..4 + 128]), U256::from(0x80));
        assert_eq!(U256::from_big_endian(&data[4 + 128..4 + 160]), U256::from(2));
    }

    #[test]
    fn test_get_transaction_hash_selector_and_zeroed_gas() {
        let data = encode_get_transaction_hash(
            Address::repeat_byte(0x11),
            U256::zero(),
            Bytes::from(vec![0xde, 0xad]),
            OperationType::DelegateCall,
            U256::from(7),
        );

        let expected_selector = ethers::utils::id(
            "getTransactionHash(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,uint256)",
        );
        assert_eq!(&data[..4], &expected_selector);

        let word = |i: usize| U256::from_big_endian(&data[4 + 32 * i..4 + 32 * (i + 1)]);
        assert_eq!(word(3), U256::one()); // operation
        assert_eq!(word(4), U256::zero()); // safeTxGas
        assert_eq!(word(5), U256::zero()); // baseGas
        assert_eq!(word(6), U256::zero()); // gasPrice
        assert_eq!(word(9), U256::from(7)); // nonce
    }

    #[test]
    fn test_compute_proxy_address_selector() {
        let data = encode_compute_proxy_address(Address::repeat_byte(0x22));
        assert_eq!(&data[..4], &ethers::utils::id("computeProxyAddress(address)"));
        assert_eq!(data.len(), 36);
    }

    #[test]
    fn test_balance_of_and_approvals() {
        let balance = encode_balance_of(Address::repeat_byte(0x01), U256::from(5));
        assert_eq!(&balance[..4], &ethers::utils::id("balanceOf(address,uint256)"));

        let approve = encode_erc20_approve(Address::repeat_byte(0x02), U256::MAX);
        assert_eq!(hex::encode(&approve[..4]), "095ea7b3");

        let approval = encode_set_approval_for_all(Address::repeat_byte(0x03), true);
        assert_eq!(&approval[..4], &ethers::utils::id("setApprovalForAll(address,bool)"));
        assert_eq!(approval[approval.len() - 1], 1);
    }

    #[test]
    fn test_decoders() {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&[0x33; 20]);
        assert_eq!(decode_address_word(&word).unwrap(), Address::repeat_byte(0x33));
        assert_eq!(decode_bytes32(&word).unwrap(), H256::from(word));
        assert!(decode_uint(&[0u8; 8]).is_err());
    }
}
