//! Order-side value types: side, time-in-force, tick size

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::models::DomainError;

/// Order side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Exchange encoding (BUY = 0, SELL = 1)
    pub fn code(self) -> u8 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    GTC, // Good Till Cancel
    FOK, // Fill Or Kill
    GTD, // Good Till Date
    FAK, // Fill And Kill
}

impl OrderType {
    /// Convert to API string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::GTC => "GTC",
            OrderType::GTD => "GTD",
            OrderType::FOK => "FOK",
            OrderType::FAK => "FAK",
        }
    }
}

/// Decimal places used when rounding an order for a given tick size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundConfig {
    pub price: u32,
    pub size: u32,
    pub amount: u32,
}

/// Minimum price increment of a market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TickSize {
    Tenth,
    #[default]
    Hundredth,
    Thousandth,
    TenThousandth,
}

impl TickSize {
    pub fn as_str(self) -> &'static str {
        match self {
            TickSize::Tenth => "0.1",
            TickSize::Hundredth => "0.01",
            TickSize::Thousandth => "0.001",
            TickSize::TenThousandth => "0.0001",
        }
    }

    pub fn as_decimal(self) -> Decimal {
        match self {
            TickSize::Tenth => Decimal::new(1, 1),
            TickSize::Hundredth => Decimal::new(1, 2),
            TickSize::Thousandth => Decimal::new(1, 3),
            TickSize::TenThousandth => Decimal::new(1, 4),
        }
    }

    /// Larger ticks get fewer amount decimals.
    pub fn rounding(self) -> RoundConfig {
        match self {
            TickSize::Tenth => RoundConfig { price: 1, size: 2, amount: 3 },
            TickSize::Hundredth => RoundConfig { price: 2, size: 2, amount: 4 },
            TickSize::Thousandth => RoundConfig { price: 3, size: 2, amount: 5 },
            TickSize::TenThousandth => RoundConfig { price: 4, size: 2, amount: 6 },
        }
    }

    pub fn all() -> [TickSize; 4] {
        [
            TickSize::Tenth,
            TickSize::Hundredth,
            TickSize::Thousandth,
            TickSize::TenThousandth,
        ]
    }
}

impl FromStr for TickSize {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = Decimal::from_str(s.trim())
            .map_err(|_| DomainError::UnknownTickSize(s.to_string()))?
            .normalize();

        TickSize::all()
            .into_iter()
            .find(|tick| tick.as_decimal() == parsed)
            .ok_or_else(|| DomainError::UnknownTickSize(s.to_string()))
    }
}

impl TryFrom<String> for TickSize {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TickSize> for String {
    fn from(tick: TickSize) -> Self {
        tick.as_str().to_string()
    }
}

impl std::fmt::Display for TickSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
