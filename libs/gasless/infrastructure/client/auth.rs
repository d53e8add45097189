//! Request authentication
//!
//! - L1: EIP-712 `ClobAuth` signature by the wallet key (API key management)
//! - L2: HMAC-SHA256 over `timestamp + method + path + body` with the API secret
//! - Builder: the same HMAC scheme with relay builder credentials

use base64::{engine::general_purpose::URL_SAFE, Engine};
use ethers::types::{Address, H256, U256};
use ethers::utils::{keccak256, to_checksum};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::infrastructure::encoding::words::{encode_address, encode_uint256, hash_words, typed_data_digest};
use crate::infrastructure::signer::Signer;

type HmacSha256 = Hmac<sha2::Sha256>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to sign message: {0}")]
    SigningError(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("HMAC error: {0}")]
    HmacError(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// API credentials (L2 auth or relay builder auth)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiCredentials {
    #[serde(alias = "apiKey")]
    pub key: String,
    pub secret: String,
    pub passphrase: String,
}

const CLOB_AUTH_DOMAIN_TYPE: &[u8] = b"EIP712Domain(string name,string version,uint256 chainId)";
const CLOB_AUTH_TYPE: &[u8] = b"ClobAuth(address address,string timestamp,uint256 nonce,string message)";
const CLOB_AUTH_DOMAIN_NAME: &str = "ClobAuthDomain";
const CLOB_AUTH_DOMAIN_VERSION: &str = "1";
const CLOB_AUTH_MESSAGE: &str = "This message attests that I control the given wallet";

/// Base64 HMAC-SHA256 over `timestamp + method + path + body`.
///
/// The secret is URL-safe base64; the output is URL-safe base64 too.
pub fn hmac_signature(
    secret: &str,
    timestamp: u64,
    method: &str,
    path: &str,
    body: &str,
) -> Result<String> {
    let secret_bytes = URL_SAFE
        .decode(secret)
        .map_err(|e| AuthError::HmacError(format!("Failed to decode secret: {}", e)))?;

    let message = format!("{}{}{}{}", timestamp, method, path, body);

    let mut mac = HmacSha256::new_from_slice(&secret_bytes)
        .map_err(|e| AuthError::HmacError(e.to_string()))?;
    mac.update(message.as_bytes());

    Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
}

/// Relay builder headers for one request.
pub fn builder_headers(
    credentials: &ApiCredentials,
    timestamp: u64,
    method: &str,
    path: &str,
    body: &str,
) -> Result<HashMap<String, String>> {
    let signature = hmac_signature(&credentials.secret, timestamp, method, path, body)?;

    let mut headers = HashMap::new();
    headers.insert("POLY_BUILDER_API_KEY".to_string(), credentials.key.clone());
    headers.insert("POLY_BUILDER_PASSPHRASE".to_string(), credentials.passphrase.clone());
    headers.insert("POLY_BUILDER_SIGNATURE".to_string(), signature);
    headers.insert("POLY_BUILDER_TIMESTAMP".to_string(), timestamp.to_string());
    Ok(headers)
}

/// Current Unix timestamp in seconds
pub fn current_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// CLOB authentication manager: L1 signing with the wallet key, L2 with API credentials.
pub struct ApiAuth {
    signer: Arc<Signer>,
    chain_id: u64,
    api_key: Option<ApiCredentials>,
}

impl ApiAuth {
    pub fn new(signer: Arc<Signer>, chain_id: u64) -> Self {
        Self {
            signer,
            chain_id,
            api_key: None,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Set API credentials (L2 auth)
    pub fn set_api_key(&mut self, credentials: ApiCredentials) {
        self.api_key = Some(credentials);
    }

    pub fn api_key(&self) -> Option<&ApiCredentials> {
        self.api_key.as_ref()
    }

    /// EIP-712 digest of `ClobAuth(address address,string timestamp,uint256 nonce,string message)`.
    pub fn clob_auth_digest(&self, timestamp: u64, nonce: u64) -> H256 {
        let domain_separator = hash_words(&[
            keccak256(CLOB_AUTH_DOMAIN_TYPE),
            keccak256(CLOB_AUTH_DOMAIN_NAME),
            keccak256(CLOB_AUTH_DOMAIN_VERSION),
            encode_uint256(U256::from(self.chain_id)),
        ]);
        let struct_hash = hash_words(&[
            keccak256(CLOB_AUTH_TYPE),
            encode_address(self.address()),
            keccak256(timestamp.to_string()),
            encode_uint256(U256::from(nonce)),
            keccak256(CLOB_AUTH_MESSAGE),
        ]);
        H256::from(typed_data_digest(domain_separator, struct_hash))
    }

    /// Generate the L1 signature for API key management.
    pub fn sign_l1_message(&self, timestamp: u64, nonce: u64) -> Result<String> {
        self.signer
            .sign_recoverable_hex(self.clob_auth_digest(timestamp, nonce))
            .map_err(|e| AuthError::SigningError(e.to_string()))
    }

    /// Address, signature and timestamp; both levels start from these.
    fn base_headers(&self, signature: String, timestamp: u64) -> HashMap<String, String> {
        HashMap::from([
            ("POLY_ADDRESS".to_string(), to_checksum(&self.address(), None)),
            ("POLY_SIGNATURE".to_string(), signature),
            ("POLY_TIMESTAMP".to_string(), timestamp.to_string()),
        ])
    }

    /// Headers for `/auth/api-key` and `/auth/derive-api-key`.
    pub fn l1_headers(&self, timestamp: u64, nonce: u64) -> Result<HashMap<String, String>> {
        let mut headers = self.base_headers(self.sign_l1_message(timestamp, nonce)?, timestamp);
        headers.insert("POLY_NONCE".to_string(), nonce.to_string());
        Ok(headers)
    }

    /// Headers for authenticated trading endpoints.
    pub fn l2_headers(
        &self,
        timestamp: u64,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<HashMap<String, String>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(AuthError::MissingCredentials("CLOB API key not set"))?;

        let signature = hmac_signature(&api_key.secret, timestamp, method, path, body)?;

        let mut headers = self.base_headers(signature, timestamp);
        headers.insert("POLY_API_KEY".to_string(), api_key.key.clone());
        headers.insert("POLY_PASSPHRASE".to_string(), api_key.passphrase.clone());

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Signature;

    const TEST_KEY: &str = "0x257091039adf0d3df1f3171508f7db838782ee9b4f6ad61054be773e7541d90a";

    fn auth() -> ApiAuth {
        ApiAuth::new(Arc::new(Signer::new(TEST_KEY, 137).unwrap()), 137)
    }

    fn creds() -> ApiCredentials {
        // "dGVzdF9zZWNyZXRfMTIzNDU2" is base64 for "test_secret_123456"
        ApiCredentials {
            key: "test_key".to_string(),
            secret: "dGVzdF9zZWNyZXRfMTIzNDU2".to_string(),
            passphrase: "test_pass".to_string(),
        }
    }

    #[test]
    fn test_l1_signature_recovers_to_wallet() {
        let auth = auth();
        let signature = auth.sign_l1_message(1_700_000_000, 0).unwrap();
        assert!(signature.starts_with("0x"));

        let bytes = hex::decode(&signature[2..]).unwrap();
        let parsed = Signature::try_from(bytes.as_slice()).unwrap();
        let digest = auth.clob_auth_digest(1_700_000_000, 0);
        assert_eq!(parsed.recover(digest).unwrap(), auth.address());
    }

    #[test]
    fn test_l1_digest_depends_on_nonce_and_timestamp() {
        let auth = auth();
        let base = auth.clob_auth_digest(1, 0);
        assert_ne!(base, auth.clob_auth_digest(2, 0));
        assert_ne!(base, auth.clob_auth_digest(1, 1));
    }

    #[test]
    fn test_l1_headers() {
        let headers = auth().l1_headers(1234567890, 3).unwrap();
        assert_eq!(headers["POLY_ADDRESS"], "0x497284Cd581433f3C8224F07556a8d903113E0D3");
        assert_eq!(headers["POLY_TIMESTAMP"], "1234567890");
        assert_eq!(headers["POLY_NONCE"], "3");
        assert_eq!(headers["POLY_SIGNATURE"].len(), 132);
    }

    #[test]
    fn test_l2_requires_credentials() {
        let auth = auth();
        assert!(matches!(
            auth.l2_headers(1, "POST", "/orders", "[]"),
            Err(AuthError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_l2_headers() {
        let mut auth = auth();
        auth.set_api_key(creds());

        let headers = auth.l2_headers(1234567890, "POST", "/orders", "[]").unwrap();
        assert_eq!(headers["POLY_API_KEY"], "test_key");
        assert_eq!(headers["POLY_PASSPHRASE"], "test_pass");

        let sig = URL_SAFE.decode(&headers["POLY_SIGNATURE"]).unwrap();
        assert_eq!(sig.len(), 32);
    }

    #[test]
    fn test_hmac_is_body_sensitive() {
        let secret = creds().secret;
        let compact = hmac_signature(&secret, 1, "POST", "/submit", "{\"a\":1}").unwrap();
        let spaced = hmac_signature(&secret, 1, "POST", "/submit", "{\"a\": 1}").unwrap();
        assert_ne!(compact, spaced);
        assert_eq!(
            compact,
            hmac_signature(&secret, 1, "POST", "/submit", "{\"a\":1}").unwrap()
        );
    }

    #[test]
    fn test_builder_headers() {
        let headers = builder_headers(&creds(), 42, "POST", "/submit", "{}").unwrap();
        assert_eq!(headers["POLY_BUILDER_API_KEY"], "test_key");
        assert_eq!(headers["POLY_BUILDER_TIMESTAMP"], "42");
        assert!(headers.contains_key("POLY_BUILDER_SIGNATURE"));
        assert!(headers.contains_key("POLY_BUILDER_PASSPHRASE"));
    }

    #[test]
    fn test_invalid_secret_is_an_error() {
        assert!(matches!(
            hmac_signature("not base64!!", 1, "GET", "/", ""),
            Err(AuthError::HmacError(_))
        ));
    }
}
