//! Aggregate error for client operations

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::client::clob::OrderBuilderError;
use crate::infrastructure::{
    AuthError, BuildError, ConfigError, EncodeError, GatewayError, PollError, RelayError, RestError, SignerError,
};

#[derive(Error, Debug)]
pub enum GaslessError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Relay actions need a proxy or Safe wallet; the client is in EOA mode")]
    EoaRelay,

    #[error("Relay rejected transaction ({state}): {reason}")]
    RelayRejected { state: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Rest(#[from] RestError),

    #[error(transparent)]
    Order(#[from] OrderBuilderError),
}

pub type Result<T> = std::result::Result<T, GaslessError>;
