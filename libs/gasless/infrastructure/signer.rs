//! Private-key signer
//!
//! Produces raw 64-byte ECDSA signatures and 65-byte recoverable signatures
//! with `v` in the 27/28 convention. Relay payloads, Safe transactions,
//! CLOB orders and L1 auth all sign through this type.

use ethers::signers::{LocalWallet, Signer as _};
use ethers::types::{Address, Signature, H256};
use ethers::utils::hash_message;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Failed to sign hash: {0}")]
    SigningFailed(String),
}

pub type Result<T> = std::result::Result<T, SignerError>;

pub struct Signer {
    wallet: LocalWallet,
    address: Address,
}

impl Signer {
    /// Create a signer from a hex private key (with or without 0x prefix).
    pub fn new(private_key: &str, chain_id: u64) -> Result<Self> {
        let key = private_key.trim().trim_start_matches("0x");

        let wallet = key
            .parse::<LocalWallet>()
            .map_err(|e| SignerError::InvalidPrivateKey(e.to_string()))?
            .with_chain_id(chain_id);

        let address = wallet.address();

        Ok(Self { wallet, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    fn sign_raw(&self, hash: H256) -> Result<Signature> {
        self.wallet
            .sign_hash(hash)
            .map_err(|e| SignerError::SigningFailed(e.to_string()))
    }

    /// r ‖ s, no recovery byte.
    pub fn sign(&self, hash: H256) -> Result<[u8; 64]> {
        let signature = self.sign_raw(hash)?;
        let mut out = [0u8; 64];
        signature.r.to_big_endian(&mut out[..32]);
        signature.s.to_big_endian(&mut out[32..]);
        Ok(out)
    }

    /// r ‖ s ‖ v with v = recovery id + 27.
    pub fn sign_recoverable(&self, hash: H256) -> Result<[u8; 65]> {
        let signature = self.sign_raw(hash)?;
        let mut out = [0u8; 65];
        signature.r.to_big_endian(&mut out[..32]);
        signature.s.to_big_endian(&mut out[32..64]);
        out[64] = normalize_v(signature.v);
        Ok(out)
    }

    /// Recoverable signature as a 0x-prefixed hex string.
    pub fn sign_recoverable_hex(&self, hash: H256) -> Result<String> {
        Ok(format!("0x{}", hex::encode(self.sign_recoverable(hash)?)))
    }
}

/// `v` from the curve library is either a bare recovery id (0/1) or
/// already offset to 27/28; both normalize to 27/28.
fn normalize_v(v: u64) -> u8 {
    match v {
        0 | 1 => (v + 27) as u8,
        other => other as u8,
    }
}

/// keccak256("\x19Ethereum Signed Message:\n32" ‖ hash)
pub fn eth_signed_message_hash(hash: H256) -> H256 {
    hash_message(hash.as_bytes())
}
