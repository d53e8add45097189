//! Shared client state handed to every capability

use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::info;

use super::error::{GaslessError, Result};
use crate::domain::{parse_address, RelayWalletType, SignatureType};
use crate::infrastructure::config::{ContractAddresses, GaslessConfig};
use crate::infrastructure::relay::{
    derive_proxy_wallet, resolve_safe_wallet, BuilderSettings, RelayClient, TransactionBuilder, WalletResolution,
    WalletSource,
};
use crate::infrastructure::{ChainGateway, Observability, Signer};

/// Everything a capability needs: keys, chain access, the relay and the
/// resolved maker wallet. Immutable once built; shared behind an `Arc`.
pub struct ClientContext {
    config: GaslessConfig,
    contracts: ContractAddresses,
    signer: Arc<Signer>,
    gateway: Arc<ChainGateway>,
    relay: RelayClient,
    builder: TransactionBuilder,
    wallet: WalletResolution,
    observability: Observability,
}

impl ClientContext {
    /// Dial the RPC pool, set up the relay client and resolve the maker wallet.
    pub async fn connect(config: GaslessConfig, observability: Observability) -> Result<Self> {
        let signer = Arc::new(Signer::new(&config.private_key, config.chain_id)?);
        let gateway = Arc::new(ChainGateway::connect(
            &config.rpc_urls(),
            config.rpc_timeout(),
            observability.clone(),
        )?);

        let context = Self::from_parts(config, signer, gateway, observability)?;
        let context = context.resolve_wallet().await?;

        info!(
            "Client ready: signer {:?}, {:?} wallet {:?} ({:?})",
            context.signer_address(),
            context.signature_type(),
            context.wallet_address(),
            context.wallet.source
        );
        Ok(context)
    }

    /// Assemble a context around an existing gateway. The wallet starts as
    /// the configured override or the signer's own address.
    pub fn from_parts(
        config: GaslessConfig,
        signer: Arc<Signer>,
        gateway: Arc<ChainGateway>,
        observability: Observability,
    ) -> Result<Self> {
        let contracts = config.contracts()?;

        let relay = RelayClient::new(
            config.relay.url.clone(),
            config.builder_credentials.clone(),
            config.nonce_retry_policy(),
        )?;

        let builder = TransactionBuilder::new(
            signer.clone(),
            gateway.clone(),
            BuilderSettings {
                proxy_factory: contracts.proxy_factory,
                relay_hub: contracts.relay_hub,
                multisend: contracts.multisend,
                gas_price: config.gas_price(),
                relayer_fee: config.relayer_fee(),
            },
        );

        let wallet = match config.proxy_wallet_address()? {
            Some(address) => WalletResolution {
                address,
                source: WalletSource::Configured,
            },
            None => WalletResolution {
                address: signer.address(),
                source: WalletSource::Derived,
            },
        };

        Ok(Self {
            config,
            contracts,
            signer,
            gateway,
            relay,
            builder,
            wallet,
            observability,
        })
    }

    /// Replace a non-configured wallet with the address the signature type implies.
    pub async fn resolve_wallet(mut self) -> Result<Self> {
        if self.wallet.source == WalletSource::Configured {
            return Ok(self);
        }

        let owner = self.signer.address();
        self.wallet = match self.config.signature_type {
            SignatureType::Eoa => WalletResolution {
                address: owner,
                source: WalletSource::Derived,
            },
            SignatureType::ProxyWallet => WalletResolution {
                address: derive_proxy_wallet(owner, self.contracts.proxy_factory),
                source: WalletSource::Derived,
            },
            SignatureType::SafeWallet => {
                resolve_safe_wallet(&self.gateway, owner, self.contracts.safe_factory).await
            }
        };
        Ok(self)
    }

    pub fn config(&self) -> &GaslessConfig {
        &self.config
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub fn signer(&self) -> &Arc<Signer> {
        &self.signer
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    /// Maker/funder address: the proxy or Safe in relay modes, the key's
    /// address in EOA mode.
    pub fn wallet_address(&self) -> Address {
        self.wallet.address
    }

    pub fn wallet(&self) -> WalletResolution {
        self.wallet
    }

    pub fn signature_type(&self) -> SignatureType {
        self.config.signature_type
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    pub fn gateway(&self) -> &Arc<ChainGateway> {
        &self.gateway
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    pub fn observability(&self) -> &Observability {
        &self.observability
    }

    /// Relay path for this client; EOA mode has none.
    pub fn relay_wallet_type(&self) -> Result<RelayWalletType> {
        self.signature_type().relay_type().ok_or(GaslessError::EoaRelay)
    }

    /// Relay node address and nonce for a proxy transaction.
    ///
    /// A configured relay address only needs the nonce; otherwise both come
    /// from `/relay-payload`.
    pub async fn proxy_relay_and_nonce(&self) -> Result<(Address, U256)> {
        let owner = self.signer.address();
        match self.config.relay.relay_address {
            Some(relay) => {
                let nonce = self.relay.get_relay_nonce(owner, RelayWalletType::Proxy).await?;
                Ok((relay, nonce))
            }
            None => {
                let payload = self.relay.get_relay_payload(owner, RelayWalletType::Proxy).await?;
                let relay = parse_address(&payload.address)?;
                let nonce = U256::from_dec_str(&payload.nonce)
                    .map_err(|e| GaslessError::Validation(format!("relay payload nonce {}: {}", payload.nonce, e)))?;
                Ok((relay, nonce))
            }
        }
    }
}
