//! 32-byte ABI words

use ethers::types::{Address, U256};
use ethers::utils::keccak256;

/// Encode a U256 as 32 bytes (big-endian, left-padded)
pub fn encode_uint256(value: U256) -> [u8; 32] {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    buf
}

/// Encode an address as 32 bytes (left-padded with zeros)
pub fn encode_address(addr: Address) -> [u8; 32] {
    let mut buf = [0u8; 32];
    buf[12..].copy_from_slice(addr.as_bytes());
    buf
}

/// Encode a u8 as 32 bytes (left-padded with zeros)
pub fn encode_uint8(value: u8) -> [u8; 32] {
    let mut buf = [0u8; 32];
    buf[31] = value;
    buf
}

pub fn encode_usize(value: usize) -> [u8; 32] {
    encode_uint256(U256::from(value))
}

/// Raw bytes right-padded with zeros to a multiple of 32.
pub fn pad_right(data: &[u8]) -> Vec<u8> {
    let padded_len = data.len().div_ceil(32) * 32;
    let mut out = Vec::with_capacity(padded_len);
    out.extend_from_slice(data);
    out.resize(padded_len, 0);
    out
}

/// keccak256 over a run of 32-byte words (EIP-712 `encodeData`).
pub fn hash_words(words: &[[u8; 32]]) -> [u8; 32] {
    keccak256(words.concat())
}

/// `keccak256("\x19\x01" ‖ domainSeparator ‖ structHash)`
pub fn typed_data_digest(domain_separator: [u8; 32], struct_hash: [u8; 32]) -> [u8; 32] {
    let mut message = [0u8; 66];
    message[..2].copy_from_slice(b"\x19\x01");
    message[2..34].copy_from_slice(&domain_separator);
    message[34..].copy_from_slice(&struct_hash);
    keccak256(message)
}
