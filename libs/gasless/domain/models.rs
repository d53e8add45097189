//! Chain identifiers and wallet modes

use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("Invalid hash '{value}': {reason}")]
    InvalidHash { value: String, reason: String },

    #[error("Unknown signature type code: {0}")]
    UnknownSignatureType(u8),

    #[error("Unsupported tick size: {0}")]
    UnknownTickSize(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

fn decode_fixed_hex<const N: usize>(value: &str) -> std::result::Result<[u8; N], String> {
    let hex_str = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    if hex_str.len() != N * 2 {
        return Err(format!("expected {} hex chars, got {}", N * 2, hex_str.len()));
    }

    let bytes = hex::decode(hex_str).map_err(|e| e.to_string())?;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Parse a 20-byte hex address, rejecting anything that is not exactly 40 hex chars.
pub fn parse_address(value: &str) -> Result<Address> {
    decode_fixed_hex::<20>(value)
        .map(Address::from)
        .map_err(|reason| DomainError::InvalidAddress {
            value: value.to_string(),
            reason,
        })
}

/// Parse a 32-byte hex hash (condition ids, transaction hashes).
pub fn parse_hash(value: &str) -> Result<H256> {
    decode_fixed_hex::<32>(value)
        .map(H256::from)
        .map_err(|reason| DomainError::InvalidHash {
            value: value.to_string(),
            reason,
        })
}

/// How orders and relay transactions are attributed to the user.
///
/// - `Eoa`: the signing key is also the funder; there is no relay path.
/// - `ProxyWallet`: funds sit in a factory-deployed proxy owned by the key.
/// - `SafeWallet`: funds sit in a Gnosis Safe owned by the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureType {
    Eoa,
    ProxyWallet,
    SafeWallet,
}

impl SignatureType {
    /// Exchange-side code carried in signed orders.
    pub fn code(self) -> u8 {
        match self {
            SignatureType::Eoa => 0,
            SignatureType::ProxyWallet => 1,
            SignatureType::SafeWallet => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(SignatureType::Eoa),
            1 => Ok(SignatureType::ProxyWallet),
            2 => Ok(SignatureType::SafeWallet),
            other => Err(DomainError::UnknownSignatureType(other)),
        }
    }

    /// Relay wallet type for this mode, `None` for plain EOAs.
    pub fn relay_type(self) -> Option<RelayWalletType> {
        match self {
            SignatureType::Eoa => None,
            SignatureType::ProxyWallet => Some(RelayWalletType::Proxy),
            SignatureType::SafeWallet => Some(RelayWalletType::Safe),
        }
    }
}

/// Wallet type discriminator used by the relay (`type` field and nonce scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelayWalletType {
    Proxy,
    Safe,
}

impl RelayWalletType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayWalletType::Proxy => "PROXY",
            RelayWalletType::Safe => "SAFE",
        }
    }
}

impl std::fmt::Display for RelayWalletType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
