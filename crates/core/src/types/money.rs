//! Currency codes and monetary rounding.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Error returned for an unsupported currency code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency: {0}")]
pub struct CurrencyError(pub String);

/// Currencies a product can be priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// South African rand.
    #[default]
    Zar,
    Usd,
    Eur,
}

impl Currency {
    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Zar => "ZAR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    /// Display symbol used by the storefront.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Zar => "R",
            Self::Usd => "$",
            Self::Eur => "€",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ZAR" => Ok(Self::Zar),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(CurrencyError(s.to_owned())),
        }
    }
}

/// An amount paired with its currency, for display.
///
/// ```
/// use emporium_core::{Currency, Money};
/// use rust_decimal::Decimal;
///
/// let m = Money::new(Decimal::new(12345, 2), Currency::Zar);
/// assert_eq!(m.to_string(), "R123.45");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), round_money(self.amount))
    }
}

/// Round an amount to cents, halves away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
