mod currency;
mod minor_units;

pub mod helpers;
pub mod op;
mod secret;

pub use currency::{currency_exponent, sanitize_amount, to_decimal, CurrencyError};
pub use minor_units::MinorUnits;
pub use secret::Secret;
