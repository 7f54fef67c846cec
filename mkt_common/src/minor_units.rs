use std::{
    fmt::Display,
    iter::Sum,
    ops::Add,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// ISO 4217 currencies that have no minor unit. Everything else is assumed to use two decimal places.
const ZERO_DECIMAL_CURRENCIES: [&str; 8] = ["CLP", "PYG", "JPY", "KRW", "VND", "UGX", "XAF", "XOF"];

//--------------------------------------     MinorUnits       ---------------------------------------------------------
/// A monetary amount expressed in the minor unit of its currency (cents for USD, centavos for ARS, and so on).
///
/// The currency itself is not carried by this type. It always travels alongside the amount on the owning record.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MinorUnits(i64);

op!(binary MinorUnits, Add, add);
op!(binary MinorUnits, Sub, sub);
op!(inplace MinorUnits, AddAssign, add_assign);
op!(inplace MinorUnits, SubAssign, sub_assign);
op!(unary MinorUnits, Neg, neg);

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in minor units: {0}")]
pub struct MinorUnitsConversionError(String);

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for MinorUnits {
    type Error = MinorUnitsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| MinorUnitsConversionError(format!("Value {value} is too large to convert to MinorUnits")))
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}¢", self.0)
    }
}

impl MinorUnits {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Converts the amount into the decimal major-unit representation used by payment gateways, e.g. 1050 USD cents
    /// become `10.5`.
    pub fn to_major_units(&self, currency: &str) -> f64 {
        let exponent = currency_exponent(currency);
        #[allow(clippy::cast_precision_loss)]
        let value = self.0 as f64;
        value / 10f64.powi(exponent as i32)
    }
}

/// The number of decimal places in the minor unit of the given ISO 4217 currency code.
pub fn currency_exponent(currency: &str) -> u32 {
    let code = currency.to_ascii_uppercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&code.as_str()) {
        0
    } else {
        2
    }
}

/// Currency codes are three upper-case ASCII letters.
pub fn is_valid_currency_code(currency: &str) -> bool {
    currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let mut a = MinorUnits::from(1_500);
        let b = MinorUnits::from(250);
        assert_eq!(a + b, MinorUnits::from(1_750));
        assert_eq!(a - b, MinorUnits::from(1_250));
        a -= b;
        assert_eq!(a.value(), 1_250);
        a += b;
        assert_eq!(a.value(), 1_500);
        assert_eq!(-b, MinorUnits::from(-250));
        let total: MinorUnits = [a, b, b].into_iter().sum();
        assert_eq!(total.value(), 2_000);
    }

    #[test]
    fn major_unit_conversion() {
        assert_eq!(MinorUnits::from(1_050).to_major_units("USD"), 10.5);
        assert_eq!(MinorUnits::from(250_000).to_major_units("ars"), 2_500.0);
        assert_eq!(MinorUnits::from(15_000).to_major_units("CLP"), 15_000.0);
        assert_eq!(currency_exponent("jpy"), 0);
    }

    #[test]
    fn currency_codes() {
        assert!(is_valid_currency_code("USD"));
        assert!(!is_valid_currency_code("usd"));
        assert!(!is_valid_currency_code("USDT"));
        assert!(!is_valid_currency_code("U$D"));
    }

    #[test]
    fn conversions_and_display() {
        assert!(MinorUnits::try_from(u64::MAX).is_err());
        assert_eq!(MinorUnits::try_from(42u64).map(|v| v.value()).unwrap_or_default(), 42);
        assert_eq!(MinorUnits::from(999).to_string(), "999¢");
        assert_eq!(serde_json::to_string(&MinorUnits::from(12)).unwrap(), "12");
    }
}
