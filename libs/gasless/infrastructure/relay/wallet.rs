//! Smart-wallet address derivation
//!
//! Both wallet kinds are CREATE2 deployments owned by the signing key:
//! proxies salt with the packed owner address, Safes with the ABI-encoded one.

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionRequest, H256};
use ethers::utils::{get_create2_address_from_hash, keccak256};
use tracing::{debug, warn};

use crate::infrastructure::chain::ChainGateway;
use crate::infrastructure::encoding::words::encode_address;
use crate::infrastructure::encoding::{decode_address_word, encode_compute_proxy_address};

pub const PROXY_INIT_CODE_HASH: H256 = H256([
    0xd2, 0x1d, 0xf8, 0xdc, 0x65, 0x88, 0x0a, 0x86, 0x06, 0xf0, 0x9f, 0xe0, 0xce, 0x3d, 0xf9, 0xb8,
    0x86, 0x92, 0x87, 0xab, 0x0b, 0x05, 0x8b, 0xe0, 0x5a, 0xa9, 0xe8, 0xaf, 0x63, 0x30, 0xa0, 0x0b,
]);

pub const SAFE_INIT_CODE_HASH: H256 = H256([
    0x2b, 0xce, 0x21, 0x27, 0xff, 0x07, 0xfb, 0x63, 0x2d, 0x16, 0xc8, 0x34, 0x7c, 0x4e, 0xbf, 0x50,
    0x1f, 0x48, 0x41, 0x16, 0x8b, 0xed, 0x00, 0xd9, 0xe6, 0xef, 0x71, 0x5d, 0xdb, 0x6f, 0xce, 0xcf,
]);

/// Where a wallet address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletSource {
    Configured,
    Onchain,
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletResolution {
    pub address: Address,
    pub source: WalletSource,
}

pub fn derive_proxy_wallet(owner: Address, proxy_factory: Address) -> Address {
    let salt = keccak256(owner.as_bytes());
    get_create2_address_from_hash(proxy_factory, salt, PROXY_INIT_CODE_HASH)
}

pub fn derive_safe_wallet(owner: Address, safe_factory: Address) -> Address {
    let salt = keccak256(encode_address(owner));
    get_create2_address_from_hash(safe_factory, salt, SAFE_INIT_CODE_HASH)
}

/// Ask the Safe factory for the owner's Safe, deriving locally if the call fails.
pub async fn resolve_safe_wallet(
    gateway: &ChainGateway,
    owner: Address,
    safe_factory: Address,
) -> WalletResolution {
    let tx: TypedTransaction = TransactionRequest::new()
        .to(safe_factory)
        .data(encode_compute_proxy_address(owner))
        .into();

    let onchain = match gateway.call_contract(&tx, None).await {
        Ok(data) => decode_address_word(&data).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match onchain {
        Ok(address) if !address.is_zero() => {
            debug!("Safe for {:?} resolved on-chain: {:?}", owner, address);
            WalletResolution {
                address,
                source: WalletSource::Onchain,
            }
        }
        Ok(_) => {
            warn!("Safe factory returned the zero address for {:?}, deriving locally", owner);
            local_safe(owner, safe_factory)
        }
        Err(e) => {
            warn!("computeProxyAddress failed for {:?} ({}), deriving locally", owner, e);
            local_safe(owner, safe_factory)
        }
    }
}

fn local_safe(owner: Address, safe_factory: Address) -> WalletResolution {
    WalletResolution {
        address: derive_safe_wallet(owner, safe_factory),
        source: WalletSource::Derived,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::chain::gateway::testing::{gateway_with, MockEndpoint};
    use std::sync::Arc;

    fn owner() -> Address {
        "0x497284cd581433f3c8224f07556a8d903113e0d3".parse().unwrap()
    }

    fn proxy_factory() -> Address {
        "0xaB45c5A4B0c941a2F231C04C3f49182e1A254052".parse().unwrap()
    }

    fn safe_factory() -> Address {
        "0xaacFeEa03eb1561C4e67d661e40682Bd20E3541b".parse().unwrap()
    }

    #[test]
    fn test_derive_proxy_wallet() {
        assert_eq!(
            derive_proxy_wallet(owner(), proxy_factory()),
            "0x8e74c460218c0292df3bbe7a17636c7bfc806cd2".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn test_derive_safe_wallet() {
        assert_eq!(
            derive_safe_wallet(owner(), safe_factory()),
            "0x1b861deae99d06fdf97e22b64365ea3c591f27ca".parse::<Address>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_resolve_safe_prefers_factory_answer() {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&[0x5a; 20]);
        let endpoint = Arc::new(MockEndpoint::new("a").with_call_response(word.to_vec().into()));
        let gateway = gateway_with(vec![endpoint]);

        let resolved = resolve_safe_wallet(&gateway, owner(), safe_factory()).await;
        assert_eq!(resolved.address, Address::repeat_byte(0x5a));
        assert_eq!(resolved.source, WalletSource::Onchain);
    }

    #[tokio::test]
    async fn test_resolve_safe_falls_back_to_local_derivation() {
        let endpoint = Arc::new(MockEndpoint::new("a").with_call_error("execution reverted"));
        let gateway = gateway_with(vec![endpoint]);

        let resolved = resolve_safe_wallet(&gateway, owner(), safe_factory()).await;
        assert_eq!(resolved.address, derive_safe_wallet(owner(), safe_factory()));
        assert_eq!(resolved.source, WalletSource::Derived);
    }
}
