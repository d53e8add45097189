//! API key management methods for RestClient

use super::super::helpers::{parse_json, require_success, with_headers};
use super::{RestClient, Result};
use crate::infrastructure::client::auth::{current_timestamp, ApiCredentials};
use tracing::{debug, info};

impl RestClient {
    /// Create new API key credentials (L1 auth)
    pub async fn create_api_key(&self, nonce: u64) -> Result<ApiCredentials> {
        let url = format!("{}/auth/api-key", self.base_url);
        let headers = self.auth.l1_headers(current_timestamp(), nonce)?;

        debug!("Creating API key");

        let req = with_headers(self.client.post(&url), headers);
        let response = req.send().await?;
        let response = require_success(response, "Failed to create API key").await?;

        parse_json(response).await
    }

    /// Derive API key (deterministic from private key and nonce)
    pub async fn derive_api_key(&self, nonce: u64) -> Result<ApiCredentials> {
        let url = format!("{}/auth/derive-api-key", self.base_url);
        let headers = self.auth.l1_headers(current_timestamp(), nonce)?;

        debug!("Deriving API key");

        let req = with_headers(self.client.get(&url), headers);
        let response = req.send().await?;
        let response = require_success(response, "Failed to derive API key").await?;

        parse_json(response).await
    }

    /// Derive existing credentials, creating them when none exist yet, and
    /// install them for L2 requests.
    pub async fn create_or_derive_api_key(&mut self) -> Result<ApiCredentials> {
        let credentials = match self.derive_api_key(0).await {
            Ok(creds) => creds,
            Err(e) => {
                info!("API key derivation failed ({}); creating a new key", e);
                self.create_api_key(0).await?
            }
        };
        self.auth.set_api_key(credentials.clone());
        Ok(credentials)
    }

    pub fn set_api_key(&mut self, credentials: ApiCredentials) {
        self.auth.set_api_key(credentials);
    }
}
