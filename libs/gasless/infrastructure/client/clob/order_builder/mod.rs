//! Order Builder for the CTF Exchange
//!
//! Implements EIP-712 order signing for the CLOB API.
//!
//! Split into focused modules:
//! - `types`: Order and SignedOrder structs, error types
//! - `amounts`: tick-dependent rounding of prices, sizes and amounts
//! - `signing`: EIP-712 hash computation
//! - `payload`: API payload builders

pub mod amounts;
mod payload;
pub(crate) mod signing;
mod types;

pub use payload::{build_batch_order_payload, build_order_payload};
pub use types::{Order, OrderArgs, OrderBuilderError, Result, SignedOrder};

use ethers::types::{Address, H256, U256};
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{SignatureType, TickSize};
use crate::infrastructure::signer::Signer;
use amounts::{clamp_size, order_amounts, validate_price};
use signing::compute_eip712_hash;

/// Verifying contracts for the two exchange deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeAddresses {
    pub exchange: Address,
    pub neg_risk_exchange: Address,
}

impl ExchangeAddresses {
    pub fn for_market(&self, neg_risk: bool) -> Address {
        if neg_risk {
            self.neg_risk_exchange
        } else {
            self.exchange
        }
    }
}

/// Builder for creating signed orders
///
/// For relay wallets the maker (funder) is the proxy or Safe and the signer
/// is the key's EOA. In EOA mode both are the key's address.
pub struct OrderBuilder {
    signer: Arc<Signer>,
    maker: Address,
    chain_id: u64,
    signature_type: SignatureType,
    exchanges: ExchangeAddresses,
}

impl OrderBuilder {
    pub fn new(
        signer: Arc<Signer>,
        maker: Address,
        chain_id: u64,
        signature_type: SignatureType,
        exchanges: ExchangeAddresses,
    ) -> Self {
        Self {
            signer,
            maker,
            chain_id,
            signature_type,
            exchanges,
        }
    }

    pub fn maker(&self) -> Address {
        self.maker
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    /// Build and sign an order under the given tick size and exchange.
    ///
    /// Sizes below the exchange minimum are raised to it; prices outside
    /// `[tick, 1 - tick]` are rejected.
    pub fn build_signed_order(&self, args: &OrderArgs, tick: TickSize, neg_risk: bool) -> Result<SignedOrder> {
        validate_price(args.price, tick)?;
        if args.size <= rust_decimal::Decimal::ZERO {
            return Err(OrderBuilderError::InvalidSize(format!(
                "Size must be positive, got: {}",
                args.size
            )));
        }

        let token_id = U256::from_dec_str(&args.token_id).map_err(|e| {
            OrderBuilderError::InvalidTokenId(format!("Failed to parse token ID {}: {}", args.token_id, e))
        })?;

        let size = clamp_size(args.size);
        if size != args.size {
            debug!("Raised order size {} to exchange minimum {}", args.size, size);
        }

        let (maker_amount, taker_amount) = order_amounts(args.side, size, args.price, tick.rounding())?;

        let order = Order {
            salt: generate_salt(),
            maker: self.maker,
            signer: self.signer.address(),
            taker: Address::zero(),
            token_id,
            maker_amount,
            taker_amount,
            expiration: U256::from(args.expiration),
            nonce: U256::from(args.nonce),
            fee_rate_bps: U256::from(args.fee_rate_bps),
            side: args.side,
            signature_type: self.signature_type,
        };

        self.sign_order(order, neg_risk)
    }

    /// Sign an already-populated order for the given exchange domain.
    pub fn sign_order(&self, order: Order, neg_risk: bool) -> Result<SignedOrder> {
        let hash = compute_eip712_hash(&order, self.chain_id, self.exchanges.for_market(neg_risk));

        let signature = self
            .signer
            .sign_recoverable_hex(H256::from(hash))
            .map_err(|e| OrderBuilderError::SigningError(e.to_string()))?;

        Ok(SignedOrder {
            order,
            signature,
            neg_risk,
        })
    }
}

/// Random salt in the range py-order-utils produces: `round(now * random())`.
fn generate_salt() -> U256 {
    let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
    let random: f64 = rand::thread_rng().gen();
    U256::from((now * random).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::signing::fixtures::*;
    use super::*;
    use crate::domain::Side;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const TEST_KEY: &str = "0x257091039adf0d3df1f3171508f7db838782ee9b4f6ad61054be773e7541d90a";

    fn exchanges() -> ExchangeAddresses {
        ExchangeAddresses {
            exchange: MAINNET_EXCHANGE.parse().unwrap(),
            neg_risk_exchange: MAINNET_NEG_RISK_EXCHANGE.parse().unwrap(),
        }
    }

    fn eoa_builder() -> OrderBuilder {
        let signer = Arc::new(Signer::new(TEST_KEY, 137).unwrap());
        let maker = signer.address();
        OrderBuilder::new(signer, maker, 137, SignatureType::Eoa, exchanges())
    }

    fn args(price: &str, size: &str, side: Side) -> OrderArgs {
        OrderArgs::new(
            "87681536460342357667165150330318852851476971055929009934844581402585803923513",
            Decimal::from_str(price).unwrap(),
            Decimal::from_str(size).unwrap(),
            side,
        )
    }

    #[test]
    fn test_signature_matches_python() {
        let builder = eoa_builder();
        let signed = builder.sign_order(reference_order(), false).unwrap();

        assert_eq!(
            signed.signature.to_lowercase(),
            "0x069db5e77ee9b663b7c2d9bb388b156b314d42d39d3f968edcba9ebbd662b8856a116138dc95883183889d48d615b1f4ead5a35d18b439ab0a2b45b794744d151b"
        );
        assert!(!signed.neg_risk);
    }

    #[test]
    fn test_neg_risk_changes_signature() {
        let builder = eoa_builder();
        let regular = builder.sign_order(reference_order(), false).unwrap();
        let neg_risk = builder.sign_order(reference_order(), true).unwrap();
        assert_ne!(regular.signature, neg_risk.signature);
        assert!(neg_risk.neg_risk);
    }

    #[test]
    fn test_build_signed_order_amounts() {
        let signed = eoa_builder()
            .build_signed_order(&args("0.41", "40", Side::Buy), TickSize::Hundredth, false)
            .unwrap();
        assert_eq!(signed.order.maker_amount, U256::from(16_400_000u64));
        assert_eq!(signed.order.taker_amount, U256::from(40_000_000u64));
        assert_eq!(signed.order.taker, Address::zero());
    }

    #[test]
    fn test_small_size_clamped_to_minimum() {
        let signed = eoa_builder()
            .build_signed_order(&args("0.5", "1", Side::Sell), TickSize::Hundredth, false)
            .unwrap();
        assert_eq!(signed.order.maker_amount, U256::from(5_000_000u64));
        assert_eq!(signed.order.taker_amount, U256::from(2_500_000u64));
    }

    #[test]
    fn test_relay_mode_maker_and_signer_differ() {
        let signer = Arc::new(Signer::new(TEST_KEY, 137).unwrap());
        let proxy = Address::repeat_byte(0x42);
        let builder = OrderBuilder::new(signer.clone(), proxy, 137, SignatureType::ProxyWallet, exchanges());

        let signed = builder
            .build_signed_order(&args("0.3", "10", Side::Buy), TickSize::Tenth, true)
            .unwrap();
        assert_eq!(signed.order.maker, proxy);
        assert_eq!(signed.order.signer, signer.address());
        assert_eq!(signed.to_api_json()["signatureType"], 1);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let builder = eoa_builder();
        assert!(matches!(
            builder.build_signed_order(&args("1.0", "10", Side::Buy), TickSize::Hundredth, false),
            Err(OrderBuilderError::InvalidPrice(_))
        ));
        assert!(matches!(
            builder.build_signed_order(&args("0.5", "0", Side::Buy), TickSize::Hundredth, false),
            Err(OrderBuilderError::InvalidSize(_))
        ));

        let mut bad_token = args("0.5", "10", Side::Buy);
        bad_token.token_id = "not-a-number".to_string();
        assert!(matches!(
            builder.build_signed_order(&bad_token, TickSize::Hundredth, false),
            Err(OrderBuilderError::InvalidTokenId(_))
        ));
    }

    #[test]
    fn test_salt_generation_uniqueness() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
