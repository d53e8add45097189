//! Order amount computation
//!
//! Prices snap half-up to the tick. Sizes are truncated to the size
//! precision. The derived collateral amount goes through the two-stage rule:
//! round up at `amount + 4` decimals to absorb float dust, then truncate to
//! `amount` decimals if it is still too precise.

use ethers::types::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::super::constants::{MIN_ORDER_SIZE, TOKEN_DECIMALS};
use super::types::{OrderBuilderError, Result};
use crate::domain::{RoundConfig, Side, TickSize};

pub fn decimal_places(value: Decimal) -> u32 {
    value.normalize().scale()
}

pub fn round_normal(value: Decimal, places: u32) -> Decimal {
    if decimal_places(value) <= places {
        return value;
    }
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_down(value: Decimal, places: u32) -> Decimal {
    if decimal_places(value) <= places {
        return value;
    }
    value.round_dp_with_strategy(places, RoundingStrategy::ToZero)
}

pub fn round_up(value: Decimal, places: u32) -> Decimal {
    if decimal_places(value) <= places {
        return value;
    }
    value.round_dp_with_strategy(places, RoundingStrategy::AwayFromZero)
}

/// Two-stage collateral rounding.
pub fn round_amount(value: Decimal, amount_places: u32) -> Decimal {
    if decimal_places(value) <= amount_places {
        return value;
    }
    let widened = round_up(value, amount_places + 4);
    if decimal_places(widened) > amount_places {
        round_down(widened, amount_places)
    } else {
        widened
    }
}

/// Scale to 6-decimal token units, rounding any leftover fraction.
pub fn to_token_units(value: Decimal) -> Result<U256> {
    let scaled = value
        .checked_mul(Decimal::from(10u64.pow(TOKEN_DECIMALS)))
        .ok_or_else(|| OrderBuilderError::InvalidSize(format!("amount out of range: {}", value)))?;
    let whole = round_normal(scaled, 0);
    whole
        .to_u128()
        .map(U256::from)
        .ok_or_else(|| OrderBuilderError::InvalidSize(format!("amount out of range: {}", value)))
}

/// Reject prices outside `[tick, 1 - tick]`.
pub fn validate_price(price: Decimal, tick: TickSize) -> Result<()> {
    let tick = tick.as_decimal();
    if price < tick || price > Decimal::ONE - tick {
        return Err(OrderBuilderError::InvalidPrice(format!(
            "price {} outside [{}, {}]",
            price,
            tick,
            Decimal::ONE - tick
        )));
    }
    Ok(())
}

/// Sizes below the exchange minimum are raised to it.
pub fn clamp_size(size: Decimal) -> Decimal {
    let min = Decimal::from(MIN_ORDER_SIZE);
    if size < min {
        min
    } else {
        size
    }
}

/// Maker and taker amounts in token units for a limit order.
///
/// BUY spends collateral for shares; SELL spends shares for collateral.
pub fn order_amounts(side: Side, size: Decimal, price: Decimal, config: RoundConfig) -> Result<(U256, U256)> {
    let price = round_normal(price, config.price);
    let shares = round_down(size, config.size);
    let notional = shares.checked_mul(price).ok_or_else(|| {
        OrderBuilderError::InvalidSize(format!("size {} at price {} overflows", shares, price))
    })?;
    let collateral = round_amount(notional, config.amount);

    let shares = to_token_units(shares)?;
    let collateral = to_token_units(collateral)?;

    Ok(match side {
        Side::Buy => (collateral, shares),
        Side::Sell => (shares, collateral),
    })
}
