//! Exchange API clients

pub mod auth;
pub mod clob;

pub use auth::{ApiAuth, ApiCredentials, AuthError};
pub use clob::{RestClient, RestError};
