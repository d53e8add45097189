//! Contract addresses and default RPC endpoints per chain

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::domain::parse_address;

pub const POLYGON_CHAIN_ID: u64 = 137;
pub const AMOY_CHAIN_ID: u64 = 80002;

const PROXY_FACTORY: &str = "0xaB45c5A4B0c941a2F231C04C3f49182e1A254052";
const RELAY_HUB: &str = "0xD216153c06E857cD7f72665E0aF1d7D82172F494";
const SAFE_FACTORY: &str = "0xaacFeEa03eb1561C4e67d661e40682Bd20E3541b";
const MULTISEND: &str = "0xA238CBeb142c10Ef7Ad8442C6D1f9E89e07e7761";
const NEG_RISK_ADAPTER: &str = "0xd91E80cF2E7be2e162c6513ceD06f1dD0dA35296";
const NEG_RISK_EXCHANGE: &str = "0xC5d563A36AE78145C45a50134d48A1215220f80a";

/// Every contract the client talks to, directly or through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Conditional tokens framework (ERC1155 positions)
    pub ctf: Address,
    /// USDC.e collateral
    pub collateral: Address,
    pub neg_risk_adapter: Address,
    pub exchange: Address,
    pub neg_risk_exchange: Address,
    pub proxy_factory: Address,
    pub relay_hub: Address,
    pub safe_factory: Address,
    pub multisend: Address,
}

impl ContractAddresses {
    /// Deployments for Polygon mainnet (137) and Amoy (80002).
    pub fn for_chain(chain_id: u64) -> Result<Self> {
        let (ctf, collateral, exchange) = match chain_id {
            POLYGON_CHAIN_ID => (
                "0x4D97DCd97eC945f40cF65F87097ACe5EA0476045",
                "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174",
                "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E",
            ),
            AMOY_CHAIN_ID => (
                "0x69308FB512518e39F9b16112fA8d994F4e2Bf8bB",
                "0x9c4e1703476e875070ee25b56a58b008cfb8fa78",
                "0xdFE02Eb6733538f8Ea35D585af8DE5958AD99E40",
            ),
            other => return Err(ConfigError::UnsupportedChain(other)),
        };

        Ok(Self {
            ctf: address(ctf)?,
            collateral: address(collateral)?,
            neg_risk_adapter: address(NEG_RISK_ADAPTER)?,
            exchange: address(exchange)?,
            neg_risk_exchange: address(NEG_RISK_EXCHANGE)?,
            proxy_factory: address(PROXY_FACTORY)?,
            relay_hub: address(RELAY_HUB)?,
            safe_factory: address(SAFE_FACTORY)?,
            multisend: address(MULTISEND)?,
        })
    }
}

fn address(value: &str) -> Result<Address> {
    parse_address(value).map_err(|e| ConfigError::ValidationError(e.to_string()))
}

/// Public RPC endpoints used when none are configured.
pub fn default_rpc_urls(chain_id: u64) -> Vec<String> {
    let urls: &[&str] = match chain_id {
        POLYGON_CHAIN_ID => &[
            "https://polygon-rpc.com",
            "https://polygon-bor-rpc.publicnode.com",
            "https://polygon.llamarpc.com",
            "https://rpc.ankr.com/polygon",
        ],
        AMOY_CHAIN_ID => &[
            "https://rpc-amoy.polygon.technology",
            "https://polygon-amoy-bor-rpc.publicnode.com",
        ],
        _ => &[],
    };
    urls.iter().map(|u| u.to_string()).collect()
}
