//! REST API client for the Polymarket CLOB
//!
//! Split into focused modules:
//! - `orders`: batch order placement
//! - `auth`: API key management

mod auth;
mod orders;

use super::helpers::{parse_json, require_success};
use super::types::{NegRiskResponse, TickSizeResponse, TickSizeResolution};
use crate::domain::TickSize;
use crate::infrastructure::client::auth::ApiAuth;
use crate::infrastructure::relay::RetryPolicy;
use dashmap::DashMap;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RestError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthFailed(#[from] crate::infrastructure::client::auth::AuthError),

    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),

    #[error("Failed to serialize request: {0}")]
    Serialize(String),
}

impl RestError {
    /// Transport failures and 5xx/429 responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            RestError::RequestFailed(e) => !e.is_decode() && !e.is_builder(),
            RestError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RestError>;

/// REST API client for the Polymarket CLOB
pub struct RestClient {
    pub(crate) base_url: String,
    pub(crate) client: Client,
    pub(crate) auth: ApiAuth,
    pub(crate) retry: RetryPolicy,
    tick_sizes: DashMap<String, TickSize>,
    neg_risk: DashMap<String, bool>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, auth: ApiAuth, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            auth,
            retry,
            tick_sizes: DashMap::new(),
            neg_risk: DashMap::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &ApiAuth {
        &self.auth
    }

    /// Minimum tick size of a token's market, cached per token.
    pub async fn get_tick_size(&self, token_id: &str) -> Result<TickSize> {
        if let Some(tick) = self.tick_sizes.get(token_id) {
            return Ok(*tick);
        }

        let url = format!("{}/tick-size", self.base_url);
        debug!("Fetching tick size for token {}", token_id);

        let response = self
            .client
            .get(&url)
            .query(&[("token_id", token_id)])
            .timeout(Duration::from_secs(5))
            .send()
            .await?;
        let response = require_success(response, "Failed to fetch tick size").await?;

        let parsed: TickSizeResponse = parse_json(response).await?;
        let tick = parsed.tick_size().ok_or_else(|| {
            RestError::DeserializeFailed(format!("unsupported tick size {}", parsed.minimum_tick_size))
        })?;

        self.tick_sizes.insert(token_id.to_string(), tick);
        Ok(tick)
    }

    /// Get neg_risk status for a token (affects EIP-712 domain for signing)
    pub async fn get_neg_risk(&self, token_id: &str) -> Result<bool> {
        if let Some(neg_risk) = self.neg_risk.get(token_id) {
            return Ok(*neg_risk);
        }

        let url = format!("{}/neg-risk", self.base_url);
        debug!("Fetching neg_risk for token {}", token_id);

        let response = self
            .client
            .get(&url)
            .query(&[("token_id", token_id)])
            .timeout(Duration::from_secs(5))
            .send()
            .await?;
        let response = require_success(response, "Failed to fetch neg_risk").await?;

        let neg_risk_resp: NegRiskResponse = parse_json(response).await?;
        self.neg_risk.insert(token_id.to_string(), neg_risk_resp.neg_risk);
        Ok(neg_risk_resp.neg_risk)
    }

    /// Tick size for an order: explicit value, exchange lookup, or `fallback`.
    pub async fn resolve_tick_size(
        &self,
        token_id: &str,
        explicit: Option<TickSize>,
        fallback: TickSize,
    ) -> TickSizeResolution {
        if let Some(tick) = explicit {
            return TickSizeResolution { tick, fallback: false };
        }
        match self.get_tick_size(token_id).await {
            Ok(tick) => TickSizeResolution { tick, fallback: false },
            Err(e) => {
                warn!(
                    "Tick size lookup for {} failed ({}); using fallback {}",
                    token_id, e, fallback
                );
                TickSizeResolution { tick: fallback, fallback: true }
            }
        }
    }

    /// Neg-risk flag for an order, defaulting to the regular exchange when
    /// the lookup fails. A wrong guess is repaired by the batch retry.
    pub async fn resolve_neg_risk(&self, token_id: &str, explicit: Option<bool>) -> bool {
        if let Some(neg_risk) = explicit {
            return neg_risk;
        }
        match self.get_neg_risk(token_id).await {
            Ok(neg_risk) => neg_risk,
            Err(e) => {
                warn!("neg_risk lookup for {} failed ({}); assuming false", token_id, e);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn seed_market(&self, token_id: &str, tick: TickSize, neg_risk: bool) {
        self.tick_sizes.insert(token_id.to_string(), tick);
        self.neg_risk.insert(token_id.to_string(), neg_risk);
    }
}
