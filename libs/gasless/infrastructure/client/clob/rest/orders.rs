//! Order placement methods for RestClient

use super::super::helpers::{parse_json, require_success, with_headers};
use super::super::order_builder::{build_batch_order_payload, SignedOrder};
use super::super::types::OrderPostResult;
use super::{RestClient, RestError, Result};
use crate::domain::OrderType;
use crate::infrastructure::client::auth::{current_timestamp, AuthError};
use crate::infrastructure::relay::{retry_with_backoff, to_spaced_json};
use std::time::Instant;
use tracing::{debug, error, info};

const ORDERS_PATH: &str = "/orders";

impl RestClient {
    /// Submit up to one batch of signed orders with a single `POST /orders`.
    ///
    /// `retriable` enables the backoff loop for transient failures. The
    /// exchange answers with one entry per submitted order, in order.
    pub async fn post_orders(
        &self,
        signed_orders: &[(SignedOrder, OrderType)],
        retriable: bool,
    ) -> Result<Vec<OrderPostResult>> {
        if !retriable {
            return self.post_orders_once(signed_orders).await;
        }
        retry_with_backoff(self.retry, "order batch submission", RestError::is_retryable, || {
            self.post_orders_once(signed_orders)
        })
        .await
    }

    async fn post_orders_once(&self, signed_orders: &[(SignedOrder, OrderType)]) -> Result<Vec<OrderPostResult>> {
        let url = format!("{}{}", self.base_url, ORDERS_PATH);

        let api_key = self
            .auth
            .api_key()
            .ok_or(RestError::AuthFailed(AuthError::MissingCredentials("CLOB API key not set")))?;

        let payload = build_batch_order_payload(signed_orders, &api_key.key);
        let body = to_spaced_json(&payload).map_err(|e| RestError::Serialize(e.to_string()))?;

        let timestamp = current_timestamp();
        let headers = self.auth.l2_headers(timestamp, "POST", ORDERS_PATH, &body)?;

        info!("Sending batch of {} orders ({} bytes)", signed_orders.len(), body.len());
        debug!("Order batch body: {}", body);

        let start = Instant::now();
        let request = with_headers(
            self.client.post(&url).header("Content-Type", "application/json"),
            headers,
        );

        let response = match request.body(body).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Batch order request failed after {:?}: {}", start.elapsed(), e);
                return Err(e.into());
            }
        };
        let response = require_success(response, "Failed to post orders").await?;
        let results: Vec<OrderPostResult> = parse_json(response).await?;

        info!(
            "Batch order request completed in {:?} ({} results)",
            start.elapsed(),
            results.len()
        );
        Ok(results)
    }
}
