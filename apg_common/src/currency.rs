use thiserror::Error;

use crate::MinorUnits;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),
    #[error("Amount {0} cannot be represented in minor units")]
    InvalidAmount(String),
}

const ZERO_DECIMAL_CURRENCIES: [&str; 16] = [
    "BIF", "CLP", "CVE", "DJF", "GNF", "IDR", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "VND", "VUV", "XAF", "XOF",
];

const THREE_DECIMAL_CURRENCIES: [&str; 7] = ["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// The number of decimal places Adyen expects for the given ISO-4217 currency code.
pub fn currency_exponent(currency: &str) -> Result<u32, CurrencyError> {
    let code = currency.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CurrencyError::InvalidCurrency(currency.to_string()));
    }
    if ZERO_DECIMAL_CURRENCIES.contains(&code.as_str()) {
        Ok(0)
    } else if THREE_DECIMAL_CURRENCIES.contains(&code.as_str()) {
        Ok(3)
    } else {
        Ok(2)
    }
}

/// Converts a decimal amount (as the storefront and admin UI send it) into Adyen minor units.
///
/// Rounds half away from zero, so `10.005 EUR` becomes `1001`.
pub fn sanitize_amount(amount: f64, currency: &str) -> Result<MinorUnits, CurrencyError> {
    let exponent = currency_exponent(currency)?;
    if !amount.is_finite() {
        return Err(CurrencyError::InvalidAmount(amount.to_string()));
    }
    let scaled = (amount * 10f64.powi(exponent as i32)).round();
    if scaled.abs() > i64::MAX as f64 {
        return Err(CurrencyError::InvalidAmount(amount.to_string()));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(MinorUnits::from(scaled as i64))
}

/// The reverse of [`sanitize_amount`], for display purposes only.
pub fn to_decimal(amount: MinorUnits, currency: &str) -> Result<f64, CurrencyError> {
    let exponent = currency_exponent(currency)?;
    Ok(amount.value() as f64 / 10f64.powi(exponent as i32))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exponents() {
        assert_eq!(currency_exponent("EUR"), Ok(2));
        assert_eq!(currency_exponent("jpy"), Ok(0));
        assert_eq!(currency_exponent("KWD"), Ok(3));
        assert!(currency_exponent("EURO").is_err());
        assert!(currency_exponent("E1R").is_err());
    }

    #[test]
    fn sanitizing_amounts() {
        assert_eq!(sanitize_amount(10.0, "EUR").unwrap().value(), 1000);
        assert_eq!(sanitize_amount(19.99, "USD").unwrap().value(), 1999);
        assert_eq!(sanitize_amount(0.1 + 0.2, "EUR").unwrap().value(), 30);
        assert_eq!(sanitize_amount(1500.0, "JPY").unwrap().value(), 1500);
        assert_eq!(sanitize_amount(1.2346, "KWD").unwrap().value(), 1235);
        assert!(sanitize_amount(f64::NAN, "EUR").is_err());
    }

    #[test]
    fn decimal_display() {
        assert_eq!(to_decimal(MinorUnits::from(1999), "EUR").unwrap(), 19.99);
        assert_eq!(to_decimal(MinorUnits::from(1500), "JPY").unwrap(), 1500.0);
    }
}
