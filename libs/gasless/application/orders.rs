//! Signed CLOB order batches

use std::sync::Arc;
use tracing::{info, warn, Instrument};

use super::context::ClientContext;
use super::error::{GaslessError, Result};
use crate::infrastructure::client::auth::ApiAuth;
use crate::infrastructure::client::clob::{
    submit_orders, BatchReport, ExchangeAddresses, OrderArgs, OrderBuilder, OrderTransport, PreparedOrder, RestClient,
    TickSizeResolution,
};

pub struct OrderActions {
    ctx: Arc<ClientContext>,
    rest: RestClient,
    builder: OrderBuilder,
}

impl OrderActions {
    /// Set up the CLOB client. Configured API credentials are installed;
    /// call [`OrderActions::ensure_api_key`] to derive them otherwise.
    pub fn new(ctx: Arc<ClientContext>) -> Result<Self> {
        let mut auth = ApiAuth::new(ctx.signer().clone(), ctx.chain_id());
        if let Some(credentials) = ctx.config().api_credentials.clone() {
            auth.set_api_key(credentials);
        }

        let rest = RestClient::new(ctx.config().clob.url.clone(), auth, ctx.config().nonce_retry_policy())?;

        let contracts = ctx.contracts();
        let builder = OrderBuilder::new(
            ctx.signer().clone(),
            ctx.wallet_address(),
            ctx.chain_id(),
            ctx.signature_type(),
            ExchangeAddresses {
                exchange: contracts.exchange,
                neg_risk_exchange: contracts.neg_risk_exchange,
            },
        );

        Ok(Self { ctx, rest, builder })
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn builder(&self) -> &OrderBuilder {
        &self.builder
    }

    /// Derive (or create) CLOB credentials when none are installed.
    pub async fn ensure_api_key(&mut self) -> Result<()> {
        if self.rest.auth().api_key().is_some() {
            return Ok(());
        }
        let credentials = self.rest.create_or_derive_api_key().await?;
        info!("Using CLOB API key {}", credentials.key);
        Ok(())
    }

    /// Resolve tick size and neg-risk mode for each order.
    pub async fn prepare(&self, orders: &[OrderArgs]) -> Vec<(PreparedOrder, TickSizeResolution)> {
        let fallback = self.ctx.config().clob.default_tick_size;
        let mut prepared = Vec::with_capacity(orders.len());

        for args in orders {
            let tick = self
                .rest
                .resolve_tick_size(&args.token_id, args.tick_size, fallback)
                .await;
            let neg_risk = self.rest.resolve_neg_risk(&args.token_id, args.neg_risk).await;
            prepared.push((
                PreparedOrder {
                    args: args.clone(),
                    tick: tick.tick,
                    neg_risk,
                },
                tick,
            ));
        }

        prepared
    }

    /// Sign and submit orders in chunks, with one neg-risk retry.
    pub async fn place_orders(&self, orders: &[OrderArgs]) -> Result<BatchReport> {
        let span = self.ctx.observability().span().clone();
        async {
            if orders.is_empty() {
                return Err(GaslessError::Validation("empty order batch".to_string()));
            }

            let prepared = self.prepare(orders).await;
            let fallbacks = prepared.iter().filter(|(_, tick)| tick.fallback).count();
            if fallbacks > 0 {
                warn!("{} of {} orders use the fallback tick size", fallbacks, orders.len());
            }

            let prepared: Vec<PreparedOrder> = prepared.into_iter().map(|(order, _)| order).collect();
            Ok(self.submit_prepared(&self.rest, &prepared).await)
        }
        .instrument(span)
        .await
    }

    /// Submit already-resolved orders through any transport.
    pub async fn submit_prepared<T: OrderTransport + ?Sized>(
        &self,
        transport: &T,
        orders: &[PreparedOrder],
    ) -> BatchReport {
        submit_orders(&self.builder, transport, orders).await
    }
}
