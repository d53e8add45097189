//! Relay transaction builder
//!
//! Turns encoded calls into signed relay envelopes.
//!
//! - Proxy wallets: the batch goes through the proxy factory and the signer
//!   signs the `"rlx:"` struct hash inside the signed-message envelope.
//! - Safe wallets: calls are folded into one (multiSend when several), the
//!   Safe itself computes `getTransactionHash`, and the signature's `v` is
//!   shifted into the Safe's eth_sign range.

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};
use ethers::utils::keccak256;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{
    checksum, decimal, hex_data, ProxyRelayBody, ProxySignatureParams, RelayEnvelope,
    SafeRelayBody, SafeSignatureParams,
};
use crate::domain::{ProxyCall, RelayWalletType, SafeCall};
use crate::infrastructure::chain::{ChainGateway, GatewayError};
use crate::infrastructure::encoding::words::encode_uint256;
use crate::infrastructure::encoding::{
    aggregate_safe_calls, decode_bytes32, encode_get_transaction_hash, encode_proxy_batch,
    EncodeError,
};
use crate::infrastructure::signer::{eth_signed_message_hash, Signer, SignerError};

/// Gas limit used when estimation through the gateway fails.
pub const DEFAULT_PROXY_GAS_LIMIT: u64 = 10_000_000;

const PROXY_STRUCT_PREFIX: &[u8] = b"rlx:";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Signing failed: {0}")]
    Signer(#[from] SignerError),

    #[error("getTransactionHash on Safe {safe:?} failed: {source}")]
    SafeHash { safe: Address, source: GatewayError },
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasLimitSource {
    Estimated,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasLimit {
    pub value: U256,
    pub source: GasLimitSource,
}

impl GasLimit {
    pub fn fallback() -> Self {
        Self {
            value: U256::from(DEFAULT_PROXY_GAS_LIMIT),
            source: GasLimitSource::Fallback,
        }
    }
}

/// Fixed relay-side parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderSettings {
    pub proxy_factory: Address,
    pub relay_hub: Address,
    pub multisend: Address,
    pub gas_price: U256,
    pub relayer_fee: U256,
}

/// The fields hashed for a proxy relay signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTransaction {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub relayer_fee: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub nonce: U256,
    pub relay_hub: Address,
    pub relay: Address,
}

impl ProxyTransaction {
    /// `"rlx:" ‖ from ‖ to ‖ data ‖ fee ‖ gasPrice ‖ gasLimit ‖ nonce ‖ relayHub ‖ relay`
    pub fn struct_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 20 * 4 + 32 * 4 + self.data.len());
        out.extend_from_slice(PROXY_STRUCT_PREFIX);
        out.extend_from_slice(self.from.as_bytes());
        out.extend_from_slice(self.to.as_bytes());
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&encode_uint256(self.relayer_fee));
        out.extend_from_slice(&encode_uint256(self.gas_price));
        out.extend_from_slice(&encode_uint256(self.gas_limit));
        out.extend_from_slice(&encode_uint256(self.nonce));
        out.extend_from_slice(self.relay_hub.as_bytes());
        out.extend_from_slice(self.relay.as_bytes());
        out
    }

    pub fn struct_hash(&self) -> H256 {
        H256::from(keccak256(self.struct_bytes()))
    }
}

/// Move `v` into the 31/32 range the Safe uses for eth_sign signatures.
pub fn adjust_safe_signature(mut signature: [u8; 65]) -> [u8; 65] {
    signature[64] = match signature[64] {
        0 | 27 => 31,
        1 | 28 => 32,
        other => other,
    };
    signature
}

pub struct TransactionBuilder {
    signer: Arc<Signer>,
    gateway: Arc<ChainGateway>,
    settings: BuilderSettings,
}

impl TransactionBuilder {
    pub fn new(signer: Arc<Signer>, gateway: Arc<ChainGateway>, settings: BuilderSettings) -> Self {
        Self {
            signer,
            gateway,
            settings,
        }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Estimate gas for the proxy factory call, falling back to a fixed limit.
    pub async fn estimate_proxy_gas_limit(&self, data: &Bytes) -> GasLimit {
        let tx: TypedTransaction = TransactionRequest::new()
            .from(self.signer.address())
            .to(self.settings.proxy_factory)
            .data(data.clone())
            .into();

        match self.gateway.estimate_gas(&tx).await {
            Ok(value) => {
                debug!("Estimated proxy gas limit: {}", value);
                GasLimit {
                    value,
                    source: GasLimitSource::Estimated,
                }
            }
            Err(e) => {
                warn!(
                    "Gas estimation failed ({}), using fallback limit {}",
                    e, DEFAULT_PROXY_GAS_LIMIT
                );
                GasLimit::fallback()
            }
        }
    }

    /// Encode, sign and wrap a proxy batch.
    pub async fn build_proxy_envelope(
        &self,
        calls: &[ProxyCall],
        proxy_wallet: Address,
        nonce: U256,
        relay: Address,
        metadata: &str,
    ) -> Result<(ProxyRelayBody, GasLimit)> {
        let data = encode_proxy_batch(calls)?;
        let gas_limit = self.estimate_proxy_gas_limit(&data).await;

        let tx = ProxyTransaction {
            from: self.signer.address(),
            to: self.settings.proxy_factory,
            data,
            relayer_fee: self.settings.relayer_fee,
            gas_price: self.settings.gas_price,
            gas_limit: gas_limit.value,
            nonce,
            relay_hub: self.settings.relay_hub,
            relay,
        };

        let signable = eth_signed_message_hash(tx.struct_hash());
        let signature = self.signer.sign_recoverable_hex(signable)?;

        let body = RelayEnvelope {
            data: hex_data(&tx.data),
            from: checksum(tx.from),
            metadata: metadata.to_string(),
            nonce: decimal(nonce),
            proxy_wallet: checksum(proxy_wallet),
            signature,
            signature_params: ProxySignatureParams {
                gas_price: decimal(tx.gas_price),
                gas_limit: decimal(tx.gas_limit),
                relayer_fee: decimal(tx.relayer_fee),
                relay_hub: checksum(tx.relay_hub),
                relay: checksum(tx.relay),
            },
            to: checksum(tx.to),
            wallet_type: RelayWalletType::Proxy,
        };

        Ok((body, gas_limit))
    }

    /// Ask the Safe for the hash it will check the signature against.
    pub async fn safe_transaction_hash(&self, safe: Address, call: &SafeCall, nonce: U256) -> Result<H256> {
        let data = encode_get_transaction_hash(call.to, call.value, call.data.clone(), call.operation, nonce);
        let tx: TypedTransaction = TransactionRequest::new().to(safe).data(data).into();

        let returned = self
            .gateway
            .call_contract(&tx, None)
            .await
            .map_err(|source| BuildError::SafeHash { safe, source })?;

        Ok(decode_bytes32(&returned)?)
    }

    /// Aggregate, hash on-chain, sign and wrap a Safe batch.
    pub async fn build_safe_envelope(
        &self,
        calls: &[SafeCall],
        safe: Address,
        nonce: U256,
        metadata: &str,
    ) -> Result<SafeRelayBody> {
        let call = aggregate_safe_calls(calls, self.settings.multisend)?;
        let hash = self.safe_transaction_hash(safe, &call, nonce).await?;

        let signature = self
            .signer
            .sign_recoverable(eth_signed_message_hash(hash))
            .map(adjust_safe_signature)?;

        Ok(RelayEnvelope {
            data: hex_data(&call.data),
            from: checksum(self.signer.address()),
            metadata: metadata.to_string(),
            nonce: decimal(nonce),
            proxy_wallet: checksum(safe),
            signature: hex_data(&signature),
            signature_params: SafeSignatureParams {
                gas_price: "0".to_string(),
                operation: call.operation.code().to_string(),
                safe_txn_gas: "0".to_string(),
                base_gas: "0".to_string(),
                gas_token: checksum(Address::zero()),
                refund_receiver: checksum(Address::zero()),
            },
            to: checksum(call.to),
            wallet_type: RelayWalletType::Safe,
        })
    }
}
