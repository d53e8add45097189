//! HTTP client for the gasless relay
//!
//! - `GET /nonce`: per-wallet relay nonce, retried with backoff
//! - `GET /relay-payload`: current relay node address plus nonce
//! - `POST /submit`: HMAC-authenticated envelope submission
//! - `GET /transaction`: relay-side status of a submission

use ethers::types::{Address, U256};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::json::to_spaced_json;
use super::retry::{retry_with_backoff, RetryPolicy};
use super::types::{RelayEnvelope, RelayOutcome, RelayPayload, RelayState, RelayTransaction};
use crate::domain::{parse_hash, RelayWalletType};
use crate::infrastructure::client::auth::{builder_headers, current_timestamp, ApiCredentials, AuthError};

pub const DEFAULT_RELAYER_URL: &str = "https://relayer-v2.polymarket.com";

const SUBMIT_PATH: &str = "/submit";
const SAFE_SIGNATURE_REJECTED: &str = "GS026";

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Relay request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Relay returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unparseable relay nonce: {0}")]
    InvalidNonce(String),

    #[error("Relay builder credentials are not configured")]
    MissingCredentials,

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Failed to serialize relay body: {0}")]
    Serialize(String),

    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),

    #[error("Safe rejected the signature (GS026): {0}")]
    InvalidSafeSignature(String),
}

impl RelayError {
    /// Timeouts, connection failures and non-2xx statuses are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::RequestFailed(e) => !e.is_decode() && !e.is_builder(),
            RelayError::Status { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// Parse a nonce delivered as a JSON string or a JSON number.
pub fn parse_nonce(value: &Value) -> Result<U256> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(RelayError::InvalidNonce(other.to_string())),
    };
    U256::from_dec_str(&text).map_err(|_| RelayError::InvalidNonce(text))
}

pub(crate) fn deserialize_nonce_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_nonce(&value)
        .map(|nonce| nonce.to_string())
        .map_err(serde::de::Error::custom)
}

fn string_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// Classify a `/submit` response body.
///
/// A transaction hash means the relay broadcast the call. A failure state
/// is terminal. Anything else is accepted-but-pending.
pub fn interpret_response(value: &Value) -> Result<RelayOutcome> {
    let transaction_id =
        string_field(value, &["transactionID", "transactionId"]).map(str::to_string);

    if let Some(hash) = string_field(value, &["transactionHash", "txHash", "hash"]) {
        let transaction_hash =
            parse_hash(hash).map_err(|e| RelayError::DeserializeFailed(e.to_string()))?;
        return Ok(RelayOutcome::Submitted {
            transaction_hash,
            transaction_id,
        });
    }

    let state = string_field(value, &["state"]).map(str::to_string);
    if let Some(state) = state.as_deref() {
        if RelayState::parse(state).is_failure() {
            let reason = string_field(value, &["error", "message", "reason"])
                .unwrap_or("no reason given")
                .to_string();
            return Ok(RelayOutcome::Failed {
                state: state.to_string(),
                reason,
            });
        }
    }

    Ok(RelayOutcome::Pending {
        state,
        transaction_id,
    })
}

/// Map a `/submit` HTTP status and body to an outcome.
///
/// GS026 anywhere in a rejected body or failure reason becomes
/// [`RelayError::InvalidSafeSignature`].
pub fn classify_submit_response(status: u16, text: &str) -> Result<RelayOutcome> {
    if !(200..300).contains(&status) {
        if text.contains(SAFE_SIGNATURE_REJECTED) {
            return Err(RelayError::InvalidSafeSignature(text.to_string()));
        }
        return Err(RelayError::Status {
            status,
            body: text.to_string(),
        });
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| RelayError::DeserializeFailed(format!("{}: {}", e, text)))?;

    match interpret_response(&value)? {
        RelayOutcome::Failed { reason, .. } if reason.contains(SAFE_SIGNATURE_REJECTED) => {
            Err(RelayError::InvalidSafeSignature(reason))
        }
        outcome => Ok(outcome),
    }
}

pub struct RelayClient {
    base_url: String,
    client: Client,
    credentials: Option<ApiCredentials>,
    retry: RetryPolicy,
}

impl RelayClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Option<ApiCredentials>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            client,
            credentials,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Fresh relay nonce for `(address, wallet_type)`. Never cached.
    pub async fn get_relay_nonce(&self, address: Address, wallet_type: RelayWalletType) -> Result<U256> {
        retry_with_backoff(self.retry, "relay nonce fetch", RelayError::is_retryable, || {
            self.fetch_nonce_once(address, wallet_type)
        })
        .await
    }

    async fn fetch_nonce_once(&self, address: Address, wallet_type: RelayWalletType) -> Result<U256> {
        let url = format!("{}/nonce", self.base_url);
        let address = format!("{:?}", address);

        debug!("Fetching {} relay nonce for {}", wallet_type, address);

        let response = self
            .client
            .get(&url)
            .query(&[("address", address.as_str()), ("type", wallet_type.as_str())])
            .send()
            .await?;
        let body = Self::require_success(response).await?;

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| RelayError::InvalidNonce(format!("{}: {}", e, body)))?;
        let nonce = payload
            .get("nonce")
            .ok_or_else(|| RelayError::InvalidNonce(body.clone()))?;

        parse_nonce(nonce)
    }

    /// Relay node address and proxy nonce from `/relay-payload`.
    pub async fn get_relay_payload(
        &self,
        address: Address,
        wallet_type: RelayWalletType,
    ) -> Result<RelayPayload> {
        retry_with_backoff(self.retry, "relay payload fetch", RelayError::is_retryable, move || async move {
            let url = format!("{}/relay-payload", self.base_url);
            let address = format!("{:?}", address);
            let kind = wallet_type.as_str().to_lowercase();

            let response = self
                .client
                .get(&url)
                .query(&[("address", address.as_str()), ("type", kind.as_str())])
                .send()
                .await?;
            let body = Self::require_success(response).await?;

            serde_json::from_str::<RelayPayload>(&body)
                .map_err(|e| RelayError::DeserializeFailed(format!("{}: {}", e, body)))
        })
        .await
    }

    /// Submit a signed envelope. The body is spaced JSON and the builder
    /// HMAC covers exactly the bytes sent.
    pub async fn submit<P: Serialize>(&self, envelope: &RelayEnvelope<P>) -> Result<RelayOutcome> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(RelayError::MissingCredentials)?;

        let body = to_spaced_json(envelope).map_err(|e| RelayError::Serialize(e.to_string()))?;
        let timestamp = current_timestamp();
        let headers = builder_headers(credentials, timestamp, "POST", SUBMIT_PATH, &body)?;

        let url = format!("{}{}", self.base_url, SUBMIT_PATH);
        info!(
            "Submitting {} relay transaction (nonce {}, {} bytes)",
            envelope.wallet_type,
            envelope.nonce,
            body.len()
        );
        debug!("Relay body: {}", body);

        let request = headers.into_iter().fold(
            self.client
                .post(&url)
                .header("Content-Type", "application/octet-stream"),
            |req, (k, v)| req.header(k, v),
        );
        let response = request.body(body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        let outcome = classify_submit_response(status.as_u16(), &text)?;
        match &outcome {
            RelayOutcome::Failed { state, reason } => {
                warn!("Relay rejected transaction: {} ({})", state, reason);
            }
            RelayOutcome::Pending { state, transaction_id } => {
                info!(
                    "Relay accepted transaction {:?} without a hash (state {:?})",
                    transaction_id, state
                );
            }
            RelayOutcome::Submitted { transaction_hash, .. } => {
                info!("Relay broadcast transaction {:?}", transaction_hash);
            }
        }

        Ok(outcome)
    }

    /// Relay-side record of a submission.
    pub async fn get_transaction(&self, transaction_id: &str) -> Result<Vec<RelayTransaction>> {
        let url = format!("{}/transaction", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("id", transaction_id)])
            .send()
            .await?;
        let body = Self::require_success(response).await?;

        serde_json::from_str(&body).map_err(|e| RelayError::DeserializeFailed(format!("{}: {}", e, body)))
    }

    async fn require_success(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::relay::types::ProxySignatureParams;
    use ethers::types::H256;
    use serde_json::json;

    /// One-connection-per-request HTTP responder for exercising the client
    /// end to end.
    mod stub {
        use std::collections::HashMap;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::task::JoinHandle;

        pub struct Request {
            pub line: String,
            pub headers: HashMap<String, String>,
            pub body: String,
        }

        impl Request {
            pub fn header(&self, name: &str) -> Option<&str> {
                self.headers.get(name).map(String::as_str)
            }
        }

        /// Answer one connection per scripted `(status, body)` and hand back
        /// the requests seen.
        pub async fn serve(script: Vec<(u16, String)>) -> (String, JoinHandle<Vec<Request>>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());

            let handle = tokio::spawn(async move {
                let mut seen = Vec::new();
                for (status, body) in script {
                    let (mut socket, _) = listener.accept().await.unwrap();
                    seen.push(read_request(&mut socket).await);
                    let response = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    socket.write_all(response.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                }
                seen
            });

            (url, handle)
        }

        async fn read_request(socket: &mut TcpStream) -> Request {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let mut lines = head.split("\r\n");
            let line = lines.next().unwrap_or_default().to_string();
            let headers: HashMap<String, String> = lines
                .filter_map(|l| l.split_once(':'))
                .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
                .collect();

            let length: usize = headers
                .get("content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            while buf.len() < head_end + length {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before body");
                buf.extend_from_slice(&chunk[..n]);
            }

            Request {
                line,
                headers,
                body: String::from_utf8_lossy(&buf[head_end..head_end + length]).to_string(),
            }
        }
    }

    #[test]
    fn test_parse_nonce_string_or_number() {
        assert_eq!(parse_nonce(&json!("17")).unwrap(), U256::from(17));
        assert_eq!(parse_nonce(&json!(17)).unwrap(), U256::from(17));
        assert_eq!(parse_nonce(&json!(" 0 ")).unwrap(), U256::zero());
    }

    #[test]
    fn test_parse_nonce_rejects_garbage() {
        assert!(matches!(parse_nonce(&json!("abc")), Err(RelayError::InvalidNonce(_))));
        assert!(matches!(parse_nonce(&json!(null)), Err(RelayError::InvalidNonce(_))));
        assert!(matches!(parse_nonce(&json!(-1)), Err(RelayError::InvalidNonce(_))));
        assert!(!RelayError::InvalidNonce("x".into()).is_retryable());
    }

    #[test]
    fn test_status_errors_are_retryable() {
        let err = RelayError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert!(err.is_retryable());
        assert!(!RelayError::InvalidSafeSignature("GS026".into()).is_retryable());
    }

    #[test]
    fn test_interpret_submitted() {
        let hash = format!("0x{}", "ab".repeat(32));
        for key in ["transactionHash", "txHash", "hash"] {
            let outcome = interpret_response(&json!({ key: hash, "transactionID": "id-1" })).unwrap();
            assert_eq!(
                outcome,
                RelayOutcome::Submitted {
                    transaction_hash: H256::repeat_byte(0xab),
                    transaction_id: Some("id-1".to_string()),
                }
            );
        }
    }

    #[test]
    fn test_interpret_failed_states() {
        let outcome =
            interpret_response(&json!({"state": "STATE_FAILED", "error": "boom"})).unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::Failed {
                state: "STATE_FAILED".to_string(),
                reason: "boom".to_string(),
            }
        );

        let outcome =
            interpret_response(&json!({"state": "STATE_INVALID", "reason": "bad nonce"})).unwrap();
        assert!(matches!(outcome, RelayOutcome::Failed { reason, .. } if reason == "bad nonce"));
    }

    #[test]
    fn test_interpret_pending() {
        let outcome =
            interpret_response(&json!({"state": "STATE_NEW", "transactionID": "t"})).unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::Pending {
                state: Some("STATE_NEW".to_string()),
                transaction_id: Some("t".to_string()),
            }
        );

        let outcome = interpret_response(&json!({"transactionHash": ""})).unwrap();
        assert!(matches!(outcome, RelayOutcome::Pending { state: None, .. }));
    }

    #[test]
    fn test_relay_payload_accepts_numeric_nonce() {
        let payload: RelayPayload =
            serde_json::from_str(r#"{"address":"0xabc","nonce":42}"#).unwrap();
        assert_eq!(payload.nonce, "42");
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = RelayClient::new("https://relay.example/", None, RetryPolicy::default()).unwrap();
        assert_eq!(client.base_url(), "https://relay.example");
        assert!(!client.has_credentials());
    }

    fn sample_envelope() -> RelayEnvelope<ProxySignatureParams> {
        RelayEnvelope {
            data: "0xdeadbeef".to_string(),
            from: "0x1111111111111111111111111111111111111111".to_string(),
            metadata: String::new(),
            nonce: "3".to_string(),
            proxy_wallet: "0x2222222222222222222222222222222222222222".to_string(),
            signature: "0x00".to_string(),
            signature_params: ProxySignatureParams {
                gas_price: "0".to_string(),
                gas_limit: "10000000".to_string(),
                relayer_fee: "0".to_string(),
                relay_hub: "0x3333333333333333333333333333333333333333".to_string(),
                relay: "0x4444444444444444444444444444444444444444".to_string(),
            },
            to: "0x5555555555555555555555555555555555555555".to_string(),
            wallet_type: RelayWalletType::Proxy,
        }
    }

    fn test_credentials() -> ApiCredentials {
        ApiCredentials {
            key: "builder-key".to_string(),
            secret: "cmVsYXktdGVzdC1zZWNyZXQtYnl0ZXMh".to_string(),
            passphrase: "builder-pass".to_string(),
        }
    }

    #[test]
    fn test_classify_rejected_status() {
        let err = classify_submit_response(400, r#"{"error":"GS026: invalid signature"}"#).unwrap_err();
        assert!(matches!(err, RelayError::InvalidSafeSignature(body) if body.contains("GS026")));

        let err = classify_submit_response(503, "unavailable").unwrap_err();
        assert!(matches!(err, RelayError::Status { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_failed_reason_with_gs026() {
        let body = r#"{"state":"STATE_FAILED","error":"execution reverted: GS026"}"#;
        assert!(matches!(
            classify_submit_response(200, body),
            Err(RelayError::InvalidSafeSignature(reason)) if reason == "execution reverted: GS026"
        ));

        let body = r#"{"state":"STATE_FAILED","error":"out of gas"}"#;
        assert!(matches!(
            classify_submit_response(200, body),
            Ok(RelayOutcome::Failed { reason, .. }) if reason == "out of gas"
        ));
    }

    #[test]
    fn test_classify_unparseable_success_body() {
        assert!(matches!(
            classify_submit_response(200, "not json"),
            Err(RelayError::DeserializeFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_requires_credentials() {
        let client = RelayClient::new("http://127.0.0.1:1", None, RetryPolicy::default()).unwrap();
        assert!(matches!(
            client.submit(&sample_envelope()).await,
            Err(RelayError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_submit_sends_signed_spaced_body() {
        let hash = format!("0x{}", "cd".repeat(32));
        let reply = format!(r#"{{"transactionID":"tx-9","transactionHash":"{}"}}"#, hash);
        let (url, server) = stub::serve(vec![(200, reply)]).await;

        let client = RelayClient::new(url, Some(test_credentials()), RetryPolicy::default()).unwrap();
        let envelope = sample_envelope();
        let outcome = client.submit(&envelope).await.unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::Submitted {
                transaction_hash: H256::repeat_byte(0xcd),
                transaction_id: Some("tx-9".to_string()),
            }
        );

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.line, "POST /submit HTTP/1.1");
        assert_eq!(request.header("content-type"), Some("application/octet-stream"));
        assert_eq!(request.header("poly_builder_api_key"), Some("builder-key"));
        assert_eq!(request.header("poly_builder_passphrase"), Some("builder-pass"));

        let expected_body = to_spaced_json(&envelope).unwrap();
        assert_eq!(request.body, expected_body);
        assert!(request.body.contains(r#""data": "0xdeadbeef", "from": "#));

        let timestamp: u64 = request.header("poly_builder_timestamp").unwrap().parse().unwrap();
        let expected_signature = crate::infrastructure::client::auth::hmac_signature(
            &test_credentials().secret,
            timestamp,
            "POST",
            "/submit",
            &request.body,
        )
        .unwrap();
        assert_eq!(request.header("poly_builder_signature"), Some(expected_signature.as_str()));
    }

    #[tokio::test]
    async fn test_submit_surfaces_gs026_rejection() {
        let (url, server) =
            stub::serve(vec![(400, r#"{"error":"GS026"}"#.to_string())]).await;
        let client = RelayClient::new(url, Some(test_credentials()), RetryPolicy::default()).unwrap();

        let err = client.submit(&sample_envelope()).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidSafeSignature(_)));
        assert!(!err.is_retryable());
        assert_eq!(server.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_nonce_fetch_retries_after_server_error() {
        let (url, server) = stub::serve(vec![
            (503, "busy".to_string()),
            (200, r#"{"nonce":"7"}"#.to_string()),
        ])
        .await;
        let client = RelayClient::new(url, None, RetryPolicy::new(3, Duration::from_millis(1))).unwrap();

        let nonce = client
            .get_relay_nonce(Address::repeat_byte(0x42), RelayWalletType::Safe)
            .await
            .unwrap();
        assert_eq!(nonce, U256::from(7));

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert!(request.line.starts_with("GET /nonce?address=0x4242"));
            assert!(request.line.contains("type=SAFE"));
        }
    }

    #[tokio::test]
    async fn test_nonce_fetch_gives_up_on_unreachable_relay() {
        let client = RelayClient::new(
            "http://127.0.0.1:1",
            None,
            RetryPolicy::new(2, Duration::from_millis(1)),
        )
        .unwrap();
        let err = client
            .get_relay_nonce(Address::zero(), RelayWalletType::Safe)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::RequestFailed(_)));
    }
}
