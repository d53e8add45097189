//! CTF Exchange order digests (EIP-712)

use ethers::types::{Address, U256};
use ethers::utils::keccak256;

use super::super::constants::{EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION};
use super::types::Order;
use crate::infrastructure::encoding::words::{
    encode_address, encode_uint256, encode_uint8, hash_words, typed_data_digest,
};

const DOMAIN_TYPE: &[u8] = b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const ORDER_TYPE: &[u8] = b"Order(uint256 salt,address maker,address signer,address taker,uint256 tokenId,\
uint256 makerAmount,uint256 takerAmount,uint256 expiration,uint256 nonce,uint256 feeRateBps,\
uint8 side,uint8 signatureType)";

/// Digest the maker signs for one exchange.
///
/// Regular and neg-risk markets differ only in `exchange`, so a signature
/// made for one is rejected by the other.
pub fn compute_eip712_hash(order: &Order, chain_id: u64, exchange: Address) -> [u8; 32] {
    typed_data_digest(compute_domain_separator(chain_id, exchange), compute_struct_hash(order))
}

pub fn compute_domain_separator(chain_id: u64, exchange: Address) -> [u8; 32] {
    hash_words(&[
        keccak256(DOMAIN_TYPE),
        keccak256(EIP712_DOMAIN_NAME),
        keccak256(EIP712_DOMAIN_VERSION),
        encode_uint256(U256::from(chain_id)),
        encode_address(exchange),
    ])
}

pub fn compute_struct_hash(order: &Order) -> [u8; 32] {
    hash_words(&[
        keccak256(ORDER_TYPE),
        encode_uint256(order.salt),
        encode_address(order.maker),
        encode_address(order.signer),
        encode_address(order.taker),
        encode_uint256(order.token_id),
        encode_uint256(order.maker_amount),
        encode_uint256(order.taker_amount),
        encode_uint256(order.expiration),
        encode_uint256(order.nonce),
        encode_uint256(order.fee_rate_bps),
        encode_uint8(order.side.code()),
        encode_uint8(order.signature_type.code()),
    ])
}
