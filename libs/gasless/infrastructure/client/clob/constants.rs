//! CLOB exchange constants

/// Default CLOB API endpoint
pub const DEFAULT_CLOB_URL: &str = "https://clob.polymarket.com";

// ============================================================================
// EIP-712 Domain Constants
// ============================================================================

/// EIP-712 domain name for CTF Exchange
pub const EIP712_DOMAIN_NAME: &str = "Polymarket CTF Exchange";

/// EIP-712 domain version
pub const EIP712_DOMAIN_VERSION: &str = "1";

// ============================================================================
// Token Decimals
// ============================================================================

/// Collateral and outcome tokens both use 6 decimals
pub const TOKEN_DECIMALS: u32 = 6;

// ============================================================================
// Order Limits
// ============================================================================

/// Smallest order size the exchange accepts, in shares
pub const MIN_ORDER_SIZE: u64 = 5;

/// Most orders accepted by one `POST /orders`
pub const MAX_ORDERS_PER_BATCH: usize = 15;
