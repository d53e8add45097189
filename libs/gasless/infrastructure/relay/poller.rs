//! Receipt polling with revert diagnosis

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{BlockId, BlockNumber, TransactionReceipt, TransactionRequest, H256, U64};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::infrastructure::chain::ChainGateway;

const SAFE_SIGNATURE_REJECTED: &str = "GS026";
const REVERT_PREFIX: &str = "execution reverted: ";

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Timed out after {waited:?} waiting for receipt of {hash:?}")]
    Timeout { hash: H256, waited: Duration },

    #[error("Transaction {hash:?} reverted: Safe rejected the signature (GS026)")]
    InvalidSafeSignature { hash: H256 },

    #[error("Transaction {hash:?} reverted: {reason}")]
    Reverted {
        hash: H256,
        reason: String,
        receipt: Box<TransactionReceipt>,
    },
}

pub type Result<T> = std::result::Result<T, PollError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Pull a readable reason out of a node's revert error text.
pub fn extract_revert_reason(message: &str) -> String {
    if message.contains(SAFE_SIGNATURE_REJECTED) {
        return SAFE_SIGNATURE_REJECTED.to_string();
    }
    match message.find(REVERT_PREFIX) {
        Some(idx) => message[idx + REVERT_PREFIX.len()..].trim().to_string(),
        None => message.trim().to_string(),
    }
}

/// Poll until the transaction is mined or `settings.timeout` elapses.
///
/// A mined receipt with `status == 0` is replayed one block earlier to
/// recover the revert reason.
pub async fn wait_for_receipt(
    gateway: &ChainGateway,
    hash: H256,
    settings: PollSettings,
) -> Result<TransactionReceipt> {
    let started = Instant::now();
    let deadline = started + settings.timeout;

    loop {
        match gateway.transaction_receipt(hash).await {
            Ok(Some(receipt)) => {
                if receipt.status.map(|s| s.is_zero()).unwrap_or(false) {
                    let reason = diagnose_revert(gateway, hash, &receipt).await;
                    warn!("Transaction {:?} reverted: {}", hash, reason);
                    if reason == SAFE_SIGNATURE_REJECTED {
                        return Err(PollError::InvalidSafeSignature { hash });
                    }
                    return Err(PollError::Reverted {
                        hash,
                        reason,
                        receipt: Box::new(receipt),
                    });
                }
                info!(
                    "Transaction {:?} mined in block {:?}",
                    hash, receipt.block_number
                );
                return Ok(receipt);
            }
            Ok(None) => debug!("Receipt for {:?} not available yet", hash),
            Err(e) => warn!("Receipt lookup for {:?} failed: {}", hash, e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PollError::Timeout {
                hash,
                waited: now - started,
            });
        }
        sleep(settings.interval.min(deadline - now)).await;
    }
}

/// Re-execute a reverted transaction at the parent block and report why it failed.
pub async fn diagnose_revert(
    gateway: &ChainGateway,
    hash: H256,
    receipt: &TransactionReceipt,
) -> String {
    let tx = match gateway.transaction_by_hash(hash).await {
        Ok(Some(tx)) => tx,
        Ok(None) => return "reverted (transaction not found for replay)".to_string(),
        Err(e) => return format!("reverted (replay unavailable: {})", e),
    };

    let mut request = TransactionRequest::new()
        .from(tx.from)
        .data(tx.input.clone())
        .value(tx.value)
        .gas(tx.gas);
    if let Some(to) = tx.to {
        request = request.to(to);
    }
    let call: TypedTransaction = request.into();

    let block = receipt
        .block_number
        .map(|n| BlockId::Number(BlockNumber::Number(n.saturating_sub(U64::one()))));

    match gateway.call_contract(&call, block).await {
        Ok(_) => "reverted without reason (replay succeeded)".to_string(),
        Err(e) => extract_revert_reason(e.message()),
    }
}
