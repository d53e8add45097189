pub mod contracts;

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{parse_address, SignatureType, TickSize};
use crate::infrastructure::client::auth::ApiCredentials;
use crate::infrastructure::client::clob::constants::DEFAULT_CLOB_URL;
use crate::infrastructure::relay::{PollSettings, RetryPolicy, DEFAULT_RELAYER_URL};

pub use contracts::{default_rpc_urls, ContractAddresses, AMOY_CHAIN_ID, POLYGON_CHAIN_ID};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Unsupported chain id: {0}")]
    UnsupportedChain(u64),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Gasless client configuration
///
/// Non-secret settings come from YAML; keys, credentials and the optional
/// wallet override come from the environment (`.env` is honoured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaslessConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    #[serde(default = "default_signature_type")]
    pub signature_type: SignatureType,

    /// Empty means the chain's public defaults
    #[serde(default)]
    pub rpc_urls: Vec<String>,

    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_secs: u64,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub clob: ClobConfig,

    /// Replaces the built-in addresses for `chain_id` when present
    #[serde(default)]
    pub contracts: Option<ContractAddresses>,

    /// Private key from .env (not in YAML)
    #[serde(skip)]
    pub private_key: String,

    /// Explicit maker wallet from .env (not in YAML)
    #[serde(skip)]
    pub proxy_wallet: Option<String>,

    /// Relay builder HMAC credentials from .env
    #[serde(skip)]
    pub builder_credentials: Option<ApiCredentials>,

    /// CLOB L2 credentials from .env; derived when absent
    #[serde(skip)]
    pub api_credentials: Option<ApiCredentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_relayer_url")]
    pub url: String,

    #[serde(default = "default_nonce_attempts")]
    pub nonce_retry_attempts: u32,

    #[serde(default = "default_nonce_base_delay")]
    pub nonce_retry_base_delay_ms: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Overrides the chain's relay hub
    #[serde(default)]
    pub relay_hub: Option<Address>,

    /// Relay node signing proxy transactions; fetched from the relay when absent
    #[serde(default)]
    pub relay_address: Option<Address>,

    #[serde(default)]
    pub gas_price: u64,

    #[serde(default)]
    pub relayer_fee: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: default_relayer_url(),
            nonce_retry_attempts: default_nonce_attempts(),
            nonce_retry_base_delay_ms: default_nonce_base_delay(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            relay_hub: None,
            relay_address: None,
            gas_price: 0,
            relayer_fee: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClobConfig {
    #[serde(default = "default_clob_url")]
    pub url: String,

    /// Used when the exchange's tick-size lookup fails
    #[serde(default)]
    pub default_tick_size: TickSize,
}

impl Default for ClobConfig {
    fn default() -> Self {
        Self {
            url: default_clob_url(),
            default_tick_size: TickSize::default(),
        }
    }
}

fn default_chain_id() -> u64 {
    POLYGON_CHAIN_ID
}

fn default_signature_type() -> SignatureType {
    SignatureType::ProxyWallet
}

fn default_rpc_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_relayer_url() -> String {
    DEFAULT_RELAYER_URL.to_string()
}

fn default_nonce_attempts() -> u32 {
    5
}

fn default_nonce_base_delay() -> u64 {
    1000
}

fn default_poll_interval() -> u64 {
    2
}

fn default_poll_timeout() -> u64 {
    120
}

fn default_clob_url() -> String {
    DEFAULT_CLOB_URL.to_string()
}

impl Default for GaslessConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            signature_type: default_signature_type(),
            rpc_urls: Vec::new(),
            rpc_timeout_secs: default_rpc_timeout(),
            log_level: default_log_level(),
            relay: RelayConfig::default(),
            clob: ClobConfig::default(),
            contracts: None,
            private_key: String::new(),
            proxy_wallet: None,
            builder_credentials: None,
            api_credentials: None,
        }
    }
}

/// Read a credential triple; all three variables must be present.
fn credentials_from(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    secret: &str,
    passphrase: &str,
) -> Option<ApiCredentials> {
    match (lookup(key), lookup(secret), lookup(passphrase)) {
        (Some(key), Some(secret), Some(passphrase)) => Some(ApiCredentials {
            key,
            secret,
            passphrase,
        }),
        (None, None, None) => None,
        _ => {
            warn!("Ignoring partial credentials: {}, {} and {} must all be set", key, secret, passphrase);
            None
        }
    }
}

impl GaslessConfig {
    /// Load configuration from YAML file plus environment
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        dotenv::dotenv().ok(); // Don't fail if .env doesn't exist

        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config = Self::from_yaml_str(&yaml_content)?;
        config.apply_env_with(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()));
        config.validate()?;

        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Fill secrets and overrides from a variable lookup.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("PRIVATE_KEY") {
            self.private_key = key;
        }
        if let Some(wallet) = lookup("PROXY_WALLET") {
            self.proxy_wallet = Some(wallet);
        }
        if let Some(urls) = lookup("RPC_URLS") {
            info!("Overriding RPC URLs from environment variable");
            self.rpc_urls = urls
                .split(',')
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect();
        }
        if let Some(creds) = credentials_from(&lookup, "BUILDER_API_KEY", "BUILDER_SECRET", "BUILDER_PASSPHRASE") {
            self.builder_credentials = Some(creds);
        }
        if let Some(creds) = credentials_from(&lookup, "API_KEY", "API_SECRET", "API_PASSPHRASE") {
            self.api_credentials = Some(creds);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.chain_id != POLYGON_CHAIN_ID && self.chain_id != AMOY_CHAIN_ID {
            return Err(ConfigError::UnsupportedChain(self.chain_id));
        }

        if self.private_key.is_empty() {
            return Err(ConfigError::EnvVarMissing("PRIVATE_KEY".to_string()));
        }
        let key = self.private_key.trim().trim_start_matches("0x");
        if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::ValidationError(
                "PRIVATE_KEY must be 32 bytes of hex".to_string(),
            ));
        }

        if let Some(wallet) = &self.proxy_wallet {
            parse_address(wallet).map_err(|e| ConfigError::ValidationError(format!("PROXY_WALLET: {}", e)))?;
        }

        if self.rpc_urls().is_empty() {
            return Err(ConfigError::ValidationError("rpc_urls must not be empty".to_string()));
        }
        if self.relay.url.trim().is_empty() || self.clob.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "relay.url and clob.url must not be empty".to_string(),
            ));
        }

        if self.rpc_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "rpc_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.relay.poll_interval_secs == 0 || self.relay.poll_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "relay poll interval and timeout must be greater than 0".to_string(),
            ));
        }
        if self.relay.nonce_retry_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "relay.nonce_retry_attempts must be at least 1".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Configured RPC URLs, or the chain's public list.
    pub fn rpc_urls(&self) -> Vec<String> {
        if self.rpc_urls.is_empty() {
            default_rpc_urls(self.chain_id)
        } else {
            self.rpc_urls.clone()
        }
    }

    pub fn contracts(&self) -> Result<ContractAddresses> {
        let mut contracts = match self.contracts {
            Some(contracts) => contracts,
            None => ContractAddresses::for_chain(self.chain_id)?,
        };
        if let Some(hub) = self.relay.relay_hub {
            contracts.relay_hub = hub;
        }
        Ok(contracts)
    }

    pub fn proxy_wallet_address(&self) -> Result<Option<Address>> {
        self.proxy_wallet
            .as_deref()
            .map(|w| parse_address(w).map_err(|e| ConfigError::ValidationError(e.to_string())))
            .transpose()
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn nonce_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.relay.nonce_retry_attempts,
            Duration::from_millis(self.relay.nonce_retry_base_delay_ms),
        )
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.relay.poll_interval_secs),
            timeout: Duration::from_secs(self.relay.poll_timeout_secs),
        }
    }

    pub fn gas_price(&self) -> U256 {
        U256::from(self.relay.gas_price)
    }

    pub fn relayer_fee(&self) -> U256 {
        U256::from(self.relay.relayer_fee)
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Chain id: {}", self.chain_id);
        info!("  Signature type: {:?}", self.signature_type);
        info!("  RPC endpoints: {}", self.rpc_urls().len());
        info!("  Relay: {}", self.relay.url);
        info!("  CLOB: {}", self.clob.url);
        info!("  Default tick size: {}", self.clob.default_tick_size);
        info!(
            "  Builder credentials: {}",
            if self.builder_credentials.is_some() { "set" } else { "missing" }
        );
        info!(
            "  API credentials: {}",
            if self.api_credentials.is_some() { "set" } else { "derive on startup" }
        );
        info!("  Log level: {}", self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const TEST_KEY: &str = "0x257091039adf0d3df1f3171508f7db838782ee9b4f6ad61054be773e7541d90a";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let mut config = GaslessConfig::from_yaml_str("{}").unwrap();
        config.apply_env_with(env(&[("PRIVATE_KEY", TEST_KEY)]));
        config.validate().unwrap();

        assert_eq!(config.chain_id, 137);
        assert_eq!(config.signature_type, SignatureType::ProxyWallet);
        assert_eq!(config.rpc_urls(), default_rpc_urls(137));
        assert_eq!(config.nonce_retry_policy(), RetryPolicy::default());
        assert_eq!(config.poll_settings(), PollSettings::default());
        assert_eq!(config.clob.default_tick_size, TickSize::Hundredth);
    }

    #[test]
    fn test_yaml_fields_and_env_overrides() {
        let yaml = r#"
chain_id: 80002
signature_type: safe_wallet
rpc_urls: ["https://one.example"]
log_level: debug
relay:
  poll_interval_secs: 5
  relay_address: "0x1111111111111111111111111111111111111111"
clob:
  default_tick_size: "0.001"
"#;
        let mut config = GaslessConfig::from_yaml_str(yaml).unwrap();
        config.apply_env_with(env(&[
            ("PRIVATE_KEY", TEST_KEY),
            ("RPC_URLS", "https://a.example, https://b.example,"),
            ("BUILDER_API_KEY", "k"),
            ("BUILDER_SECRET", "s"),
            ("BUILDER_PASSPHRASE", "p"),
            ("API_KEY", "only-key"),
        ]));
        config.validate().unwrap();

        assert_eq!(config.signature_type, SignatureType::SafeWallet);
        assert_eq!(config.rpc_urls(), vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.builder_credentials.as_ref().map(|c| c.key.as_str()), Some("k"));
        assert!(config.api_credentials.is_none());
        assert_eq!(config.relay.relay_address, Some(Address::repeat_byte(0x11)));
        assert_eq!(config.clob.default_tick_size, TickSize::Thousandth);
        assert_eq!(config.contracts().unwrap(), ContractAddresses::for_chain(80002).unwrap());
    }

    #[test]
    fn test_validation_failures() {
        let base = || {
            let mut config = GaslessConfig::default();
            config.private_key = TEST_KEY.to_string();
            config
        };

        let mut missing_key = base();
        missing_key.private_key.clear();
        assert!(matches!(missing_key.validate(), Err(ConfigError::EnvVarMissing(_))));

        let mut short_key = base();
        short_key.private_key = "0x1234".to_string();
        assert!(short_key.validate().is_err());

        let mut bad_chain = base();
        bad_chain.chain_id = 1;
        assert!(matches!(bad_chain.validate(), Err(ConfigError::UnsupportedChain(1))));

        let mut bad_level = base();
        bad_level.log_level = "verbose".to_string();
        assert!(bad_level.validate().is_err());

        let mut zero_poll = base();
        zero_poll.relay.poll_interval_secs = 0;
        assert!(zero_poll.validate().is_err());

        let mut bad_wallet = base();
        bad_wallet.proxy_wallet = Some("0xabc".to_string());
        assert!(bad_wallet.validate().is_err());
    }

    #[test]
    fn test_relay_hub_override() {
        let mut config = GaslessConfig::default();
        config.relay.relay_hub = Some(Address::repeat_byte(0x22));
        assert_eq!(config.contracts().unwrap().relay_hub, Address::repeat_byte(0x22));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chain_id: 137\nrpc_timeout_secs: 3").unwrap();

        // load() reads the real environment; only the YAML part is asserted.
        let config = GaslessConfig::from_yaml_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(config.rpc_timeout(), Duration::from_secs(3));

        assert!(matches!(
            GaslessConfig::load("/nonexistent/gasless.yaml"),
            Err(ConfigError::FileError(_))
        ));
    }
}
