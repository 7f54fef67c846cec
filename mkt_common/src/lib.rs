//! Small, dependency-light building blocks shared by every crate in the marketplace workspace.
//!
//! * [`MinorUnits`] is the money type. Amounts are always stored as integers in the currency's minor unit.
//! * [`Secret`] hides configuration secrets from `Debug` and `Display` output.
//! * [`helpers`] holds string and environment parsing utilities.
mod minor_units;

pub mod helpers;
pub mod op;
mod secret;

pub use minor_units::{currency_exponent, is_valid_currency_code, MinorUnits, MinorUnitsConversionError};
pub use secret::Secret;
