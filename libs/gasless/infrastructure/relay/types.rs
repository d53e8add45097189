//! Relay wire types

use ethers::types::{Address, H256, U256};
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::RelayWalletType;

/// Body of `POST /submit`. Field order is part of the signed payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelayEnvelope<P> {
    pub data: String,
    pub from: String,
    pub metadata: String,
    pub nonce: String,
    pub proxy_wallet: String,
    pub signature: String,
    pub signature_params: P,
    pub to: String,
    #[serde(rename = "type")]
    pub wallet_type: RelayWalletType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProxySignatureParams {
    pub gas_price: String,
    pub gas_limit: String,
    pub relayer_fee: String,
    pub relay_hub: String,
    pub relay: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SafeSignatureParams {
    pub gas_price: String,
    pub operation: String,
    pub safe_txn_gas: String,
    pub base_gas: String,
    pub gas_token: String,
    pub refund_receiver: String,
}

pub type ProxyRelayBody = RelayEnvelope<ProxySignatureParams>;
pub type SafeRelayBody = RelayEnvelope<SafeSignatureParams>;

pub(crate) fn checksum(address: Address) -> String {
    to_checksum(&address, None)
}

pub(crate) fn hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

pub(crate) fn decimal(value: U256) -> String {
    value.to_string()
}

/// Relay-side lifecycle of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayState {
    New,
    Executed,
    Mined,
    Confirmed,
    Failed,
    Invalid,
    Other(String),
}

impl RelayState {
    pub fn parse(state: &str) -> Self {
        match state {
            "STATE_NEW" => RelayState::New,
            "STATE_EXECUTED" => RelayState::Executed,
            "STATE_MINED" => RelayState::Mined,
            "STATE_CONFIRMED" => RelayState::Confirmed,
            "STATE_FAILED" => RelayState::Failed,
            "STATE_INVALID" => RelayState::Invalid,
            other => RelayState::Other(other.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RelayState::Failed | RelayState::Invalid)
    }

    pub fn is_final_success(&self) -> bool {
        matches!(self, RelayState::Mined | RelayState::Confirmed)
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelayState::New => "STATE_NEW",
            RelayState::Executed => "STATE_EXECUTED",
            RelayState::Mined => "STATE_MINED",
            RelayState::Confirmed => "STATE_CONFIRMED",
            RelayState::Failed => "STATE_FAILED",
            RelayState::Invalid => "STATE_INVALID",
            RelayState::Other(other) => other,
        };
        f.write_str(s)
    }
}

/// Interpreted result of a relay submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The relay broadcast the transaction.
    Submitted {
        transaction_hash: H256,
        transaction_id: Option<String>,
    },
    /// The relay accepted the request but has no hash yet.
    Pending {
        state: Option<String>,
        transaction_id: Option<String>,
    },
    /// Terminal relay-side rejection.
    Failed { state: String, reason: String },
}

/// One entry of `GET /transaction?id=`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RelayTransaction {
    #[serde(rename = "transactionID", default)]
    pub transaction_id: Option<String>,
    #[serde(rename = "transactionHash", default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(rename = "proxyAddress", default)]
    pub proxy_address: Option<String>,
    #[serde(rename = "type", default)]
    pub wallet_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

impl RelayTransaction {
    pub fn relay_state(&self) -> RelayState {
        RelayState::parse(&self.state)
    }
}

/// `GET /relay-payload`: current relay node and the proxy nonce.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RelayPayload {
    pub address: String,
    #[serde(deserialize_with = "super::client::deserialize_nonce_string")]
    pub nonce: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::relay::json::to_spaced_json;

    fn proxy_body() -> ProxyRelayBody {
        RelayEnvelope {
            data: "0x34ee9791".to_string(),
            from: "0xA".to_string(),
            metadata: String::new(),
            nonce: "3".to_string(),
            proxy_wallet: "0xB".to_string(),
            signature: "0xsig".to_string(),
            signature_params: ProxySignatureParams {
                gas_price: "0".to_string(),
                gas_limit: "10000000".to_string(),
                relayer_fee: "0".to_string(),
                relay_hub: "0xH".to_string(),
                relay: "0xR".to_string(),
            },
            to: "0xF".to_string(),
            wallet_type: RelayWalletType::Proxy,
        }
    }

    #[test]
    fn test_proxy_envelope_field_order() {
        let json = to_spaced_json(&proxy_body()).unwrap();
        assert_eq!(
            json,
            r#"{"data": "0x34ee9791", "from": "0xA", "metadata": "", "nonce": "3", "proxyWallet": "0xB", "signature": "0xsig", "signatureParams": {"gasPrice": "0", "gasLimit": "10000000", "relayerFee": "0", "relayHub": "0xH", "relay": "0xR"}, "to": "0xF", "type": "PROXY"}"#
        );
    }

    #[test]
    fn test_safe_params_field_names() {
        let params = SafeSignatureParams {
            gas_price: "0".to_string(),
            operation: "1".to_string(),
            safe_txn_gas: "0".to_string(),
            base_gas: "0".to_string(),
            gas_token: "0x0".to_string(),
            refund_receiver: "0x0".to_string(),
        };
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(
            json,
            r#"{"gasPrice":"0","operation":"1","safeTxnGas":"0","baseGas":"0","gasToken":"0x0","refundReceiver":"0x0"}"#
        );
    }

    #[test]
    fn test_relay_state() {
        assert!(RelayState::parse("STATE_FAILED").is_failure());
        assert!(RelayState::parse("STATE_INVALID").is_failure());
        assert!(RelayState::parse("STATE_CONFIRMED").is_final_success());
        assert_eq!(
            RelayState::parse("STATE_SOMETHING"),
            RelayState::Other("STATE_SOMETHING".to_string())
        );
        assert_eq!(RelayState::Mined.to_string(), "STATE_MINED");
    }

    #[test]
    fn test_relay_transaction_deserialize() {
        let tx: Vec<RelayTransaction> = serde_json::from_str(
            r#"[{"transactionID":"abc","transactionHash":"0x01","state":"STATE_MINED","type":"SAFE"}]"#,
        )
        .unwrap();
        assert_eq!(tx[0].transaction_id.as_deref(), Some("abc"));
        assert_eq!(tx[0].relay_state(), RelayState::Mined);
    }
}
