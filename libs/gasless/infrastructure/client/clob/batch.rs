//! Chunked order submission with a single neg-risk retry
//!
//! Orders are signed up front, sent in chunks of at most
//! [`MAX_ORDERS_PER_BATCH`], and mapped back to one result per input order.
//! Orders rejected with "invalid signature" were most likely signed under the
//! wrong exchange domain; they are re-signed with the neg-risk flag flipped
//! and resubmitted once.

use async_trait::async_trait;
use tracing::{info, warn};

use super::constants::MAX_ORDERS_PER_BATCH;
use super::order_builder::{OrderArgs, OrderBuilder, SignedOrder};
use super::rest::{RestClient, RestError};
use super::types::OrderPostResult;
use crate::domain::{OrderType, TickSize};

const INVALID_SIGNATURE: &str = "invalid signature";

/// Sink for signed order batches. Implemented by the REST client and by
/// test doubles.
#[async_trait]
pub trait OrderTransport: Send + Sync {
    async fn post_orders(
        &self,
        orders: &[(SignedOrder, OrderType)],
        retriable: bool,
    ) -> Result<Vec<OrderPostResult>, RestError>;
}

#[async_trait]
impl OrderTransport for RestClient {
    async fn post_orders(
        &self,
        orders: &[(SignedOrder, OrderType)],
        retriable: bool,
    ) -> Result<Vec<OrderPostResult>, RestError> {
        RestClient::post_orders(self, orders, retriable).await
    }
}

/// An order with its market parameters already resolved.
#[derive(Debug, Clone)]
pub struct PreparedOrder {
    pub args: OrderArgs,
    pub tick: TickSize,
    pub neg_risk: bool,
}

/// Outcome for one input order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderResult {
    pub token_id: String,
    pub success: bool,
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
    /// Exchange domain of the signature that produced this result
    pub neg_risk: bool,
    pub retried: bool,
}

impl OrderResult {
    fn from_response(token_id: &str, neg_risk: bool, response: OrderPostResult) -> Self {
        let success = response.is_accepted();
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        Self {
            token_id: token_id.to_string(),
            success,
            order_id: non_empty(response.order_id),
            status: non_empty(response.status),
            error: if success {
                None
            } else if response.error_msg.is_empty() {
                Some("order rejected without message".to_string())
            } else {
                Some(response.error_msg)
            },
            neg_risk,
            retried: false,
        }
    }

    fn failure(token_id: &str, neg_risk: bool, message: String) -> Self {
        Self {
            token_id: token_id.to_string(),
            success: false,
            order_id: None,
            status: None,
            error: Some(message),
            neg_risk,
            retried: false,
        }
    }

    fn error_contains(&self, needle: &str) -> bool {
        self.error
            .as_deref()
            .map(|e| e.to_lowercase().contains(needle))
            .unwrap_or(false)
    }

    pub fn is_invalid_signature(&self) -> bool {
        !self.success && self.error_contains(INVALID_SIGNATURE)
    }

    pub fn is_orderbook_missing(&self) -> bool {
        !self.success && self.error_contains("orderbook") && self.error_contains("does not exist")
    }
}

/// Per-order results in input order plus batch-level counters.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<OrderResult>,
    /// Orders resubmitted with the neg-risk flag flipped
    pub retried: usize,
    /// Orders rejected because their market has no orderbook
    pub orderbook_missing: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

struct Submitted {
    index: usize,
    signed: SignedOrder,
    order_type: OrderType,
}

/// Sign, chunk, submit, and retry a list of orders.
pub async fn submit_orders<T: OrderTransport + ?Sized>(
    builder: &OrderBuilder,
    transport: &T,
    orders: &[PreparedOrder],
) -> BatchReport {
    let mut results: Vec<Option<OrderResult>> = vec![None; orders.len()];
    let mut submitted = Vec::with_capacity(orders.len());

    for (index, order) in orders.iter().enumerate() {
        match builder.build_signed_order(&order.args, order.tick, order.neg_risk) {
            Ok(signed) => submitted.push(Submitted {
                index,
                signed,
                order_type: order.args.order_type,
            }),
            Err(e) => {
                warn!("Order {} for token {} not built: {}", index, order.args.token_id, e);
                results[index] = Some(OrderResult::failure(
                    &order.args.token_id,
                    order.neg_risk,
                    format!("order build failed: {}", e),
                ));
            }
        }
    }

    let chunk_count = submitted.len().div_ceil(MAX_ORDERS_PER_BATCH);
    let mut retried = 0;
    for (chunk_index, chunk) in submitted.chunks(MAX_ORDERS_PER_BATCH).enumerate() {
        info!(
            "Submitting order chunk {}/{} ({} orders)",
            chunk_index + 1,
            chunk_count,
            chunk.len()
        );
        for (entry, result) in chunk.iter().zip(post_chunk(transport, chunk, true).await) {
            results[entry.index] = Some(result);
        }
        retried += retry_invalid_signatures(builder, transport, chunk, &mut results).await;
    }

    let results: Vec<OrderResult> = results
        .into_iter()
        .zip(orders)
        .map(|(slot, order)| {
            slot.unwrap_or_else(|| {
                OrderResult::failure(&order.args.token_id, order.neg_risk, "order not submitted".to_string())
            })
        })
        .collect();

    let orderbook_missing = results.iter().filter(|r| r.is_orderbook_missing()).count();
    if orderbook_missing > 0 {
        warn!("{} orders rejected: orderbook does not exist", orderbook_missing);
    }

    let report = BatchReport {
        results,
        retried,
        orderbook_missing,
    };
    info!(
        "Order batch finished: {} succeeded, {} failed, {} retried",
        report.succeeded(),
        report.failed(),
        report.retried
    );
    report
}

/// Re-sign this chunk's "invalid signature" rejections under the other
/// exchange domain and resubmit them once. Returns how many were resent.
async fn retry_invalid_signatures<T: OrderTransport + ?Sized>(
    builder: &OrderBuilder,
    transport: &T,
    chunk: &[Submitted],
    results: &mut [Option<OrderResult>],
) -> usize {
    let retry: Vec<Submitted> = chunk
        .iter()
        .filter(|entry| {
            results[entry.index]
                .as_ref()
                .map(OrderResult::is_invalid_signature)
                .unwrap_or(false)
        })
        .filter_map(|entry| {
            let flipped = !entry.signed.neg_risk;
            match builder.sign_order(entry.signed.order.clone(), flipped) {
                Ok(signed) => Some(Submitted {
                    index: entry.index,
                    signed,
                    order_type: entry.order_type,
                }),
                Err(e) => {
                    warn!("Re-signing order {} failed: {}", entry.index, e);
                    None
                }
            }
        })
        .collect();

    if retry.is_empty() {
        return 0;
    }
    info!(
        "Retrying {} orders rejected for invalid signature with neg_risk flipped",
        retry.len()
    );

    for (entry, outcome) in retry.iter().zip(post_chunk(transport, &retry, false).await) {
        let slot = &mut results[entry.index];
        if outcome.success {
            let mut outcome = outcome;
            outcome.retried = true;
            *slot = Some(outcome);
        } else if let Some(original) = slot.as_mut() {
            let previous = original.error.clone().unwrap_or_default();
            original.error = Some(format!("retry failed: {}", previous));
            original.retried = true;
        }
    }
    retry.len()
}

/// One request for one chunk, always yielding exactly one result per order.
async fn post_chunk<T: OrderTransport + ?Sized>(
    transport: &T,
    chunk: &[Submitted],
    retriable: bool,
) -> Vec<OrderResult> {
    let payload: Vec<(SignedOrder, OrderType)> = chunk
        .iter()
        .map(|entry| (entry.signed.clone(), entry.order_type))
        .collect();

    match transport.post_orders(&payload, retriable).await {
        Ok(responses) => {
            if responses.len() != chunk.len() {
                warn!(
                    "Exchange returned {} results for {} orders",
                    responses.len(),
                    chunk.len()
                );
            }
            let mut responses = responses.into_iter();
            chunk
                .iter()
                .map(|entry| {
                    let token_id = entry.signed.order.token_id.to_string();
                    match responses.next() {
                        Some(response) => OrderResult::from_response(&token_id, entry.signed.neg_risk, response),
                        None => OrderResult::failure(
                            &token_id,
                            entry.signed.neg_risk,
                            "no result returned for order".to_string(),
                        ),
                    }
                })
                .collect()
        }
        Err(e) => {
            warn!("Order chunk of {} failed: {}", chunk.len(), e);
            chunk
                .iter()
                .map(|entry| {
                    OrderResult::failure(
                        &entry.signed.order.token_id.to_string(),
                        entry.signed.neg_risk,
                        format!("batch request failed: {}", e),
                    )
                })
                .collect()
        }
    }
}
