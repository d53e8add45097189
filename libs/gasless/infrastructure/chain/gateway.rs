//! Multi-endpoint chain gateway
//!
//! Round-robins read calls across the configured RPC endpoints. Each logical
//! call starts at the next cursor position and walks the pool in order,
//! moving on only when the error looks transient (rate limit, timeout,
//! connection trouble). Anything else, such as a contract revert, is
//! returned straight away.

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockId, Bytes, Transaction, TransactionReceipt, H256, U256};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::endpoint::{HttpEndpoint, RpcEndpoint};
use crate::infrastructure::observability::Observability;

#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("No RPC endpoint could be dialed: {0}")]
    NoEndpoints(String),

    #[error("all RPC nodes failed: {last}")]
    AllNodesFailed { op: &'static str, last: String },

    #[error("RPC {op} failed: {message}")]
    Rpc { op: &'static str, message: String },
}

impl GatewayError {
    /// Error text as reported by the node, without the gateway prefix.
    pub fn message(&self) -> &str {
        match self {
            GatewayError::NoEndpoints(msg) => msg,
            GatewayError::AllNodesFailed { last, .. } => last,
            GatewayError::Rpc { message, .. } => message,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

const RETRYABLE_MARKERS: &[&str] = &[
    "429",
    "too many requests",
    "rate exceeded",
    "rate limit",
    "timeout",
    "timed out",
    "deadline",
    "connection",
    "network",
    "dial",
    "eof",
    "broken pipe",
];

/// Whether an RPC error should move the call on to the next endpoint.
pub fn is_retryable_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    RETRYABLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

pub struct ChainGateway {
    endpoints: Vec<Arc<dyn RpcEndpoint>>,
    cursor: AtomicUsize,
    call_timeout: Duration,
    observability: Observability,
}

impl ChainGateway {
    /// Dial every URL; endpoints that fail to dial are logged and skipped.
    pub fn connect(
        urls: &[String],
        call_timeout: Duration,
        observability: Observability,
    ) -> Result<Self> {
        let mut endpoints: Vec<Arc<dyn RpcEndpoint>> = Vec::with_capacity(urls.len());
        let mut failures = Vec::new();

        for url in urls {
            match HttpEndpoint::dial(url) {
                Ok(endpoint) => endpoints.push(Arc::new(endpoint)),
                Err(e) => {
                    warn!("Failed to dial RPC endpoint {}: {}", url, e);
                    failures.push(format!("{}: {}", url, e));
                }
            }
        }

        if endpoints.is_empty() {
            return Err(GatewayError::NoEndpoints(if failures.is_empty() {
                "no RPC URLs configured".to_string()
            } else {
                failures.join("; ")
            }));
        }

        info!(
            "Chain gateway ready with {}/{} endpoints",
            endpoints.len(),
            urls.len()
        );

        Self::from_endpoints(endpoints, call_timeout, observability)
    }

    pub fn from_endpoints(
        endpoints: Vec<Arc<dyn RpcEndpoint>>,
        call_timeout: Duration,
        observability: Observability,
    ) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(GatewayError::NoEndpoints(
                "no RPC endpoints supplied".to_string(),
            ));
        }

        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
            call_timeout,
            observability,
        })
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn observability(&self) -> &Observability {
        &self.observability
    }

    pub async fn call_contract(
        &self,
        tx: &TypedTransaction,
        block: Option<BlockId>,
    ) -> Result<Bytes> {
        self.with_failover("eth_call", |ep| {
            let tx = tx.clone();
            async move { ep.call(&tx, block).await }
        })
        .await
    }

    pub async fn balance_at(&self, address: Address, block: Option<BlockId>) -> Result<U256> {
        self.with_failover("eth_getBalance", |ep| async move {
            ep.balance(address, block).await
        })
        .await
    }

    pub async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256> {
        self.with_failover("eth_estimateGas", |ep| {
            let tx = tx.clone();
            async move { ep.estimate_gas(&tx).await }
        })
        .await
    }

    /// `Ok(None)` means the transaction is not mined yet.
    pub async fn transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>> {
        self.with_failover("eth_getTransactionReceipt", |ep| async move {
            ep.receipt(hash).await
        })
        .await
    }

    pub async fn transaction_by_hash(&self, hash: H256) -> Result<Option<Transaction>> {
        self.with_failover("eth_getTransactionByHash", |ep| async move {
            ep.transaction(hash).await
        })
        .await
    }

    async fn with_failover<T, E, F, Fut>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: Fn(Arc<dyn RpcEndpoint>) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        let count = self.endpoints.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % count;
        let mut last_error = String::new();

        for attempt in 0..count {
            let endpoint = Arc::clone(&self.endpoints[(start + attempt) % count]);
            let total = self.observability.record_rpc_call();
            debug!("{} via {} (rpc call #{})", op, endpoint.url(), total);

            let message = match timeout(self.call_timeout, f(Arc::clone(&endpoint))).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("request timeout after {:?}", self.call_timeout),
            };

            if !is_retryable_error(&message) {
                return Err(GatewayError::Rpc { op, message });
            }

            warn!(
                "{} failed on {} (attempt {}/{}): {}",
                op,
                endpoint.url(),
                attempt + 1,
                count,
                message
            );
            last_error = message;
        }

        Err(GatewayError::AllNodesFailed {
            op,
            last: last_error,
        })
    }
}
