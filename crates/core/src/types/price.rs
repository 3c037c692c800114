//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }
}

/// Formats as symbol followed by the amount without trailing zeros
/// (`$5`, `€7.5`), the way the store settings summary shows it.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency_code.symbol(), self.amount.normalize())
    }
}

/// ISO 4217 currency codes a store can be configured with.
///
/// Codes the backend returns that are not listed here deserialize as
/// [`CurrencyCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    MXN,
    COP,
    ARS,
    CLP,
    PEN,
    #[serde(other)]
    Other,
}

impl CurrencyCode {
    /// Display symbol. Every dollar/peso currency and unknown codes use `$`.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::EUR => "€",
            Self::PEN => "S/",
            Self::USD | Self::MXN | Self::COP | Self::ARS | Self::CLP | Self::Other => "$",
        }
    }
}
