pub mod medicines;
pub mod notifications;
pub mod orders;
pub mod pharmacies;

use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::errors::AppError;

/// Prices travel as decimal strings, e.g. "9.99".
pub(crate) fn parse_price(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid {} '{}': {}", field, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(parse_price("unit_price", " 9.99 ").unwrap().to_string(), "9.99");
    }

    #[test]
    fn rejects_garbage_prices() {
        assert!(matches!(
            parse_price("unit_price", "ten"),
            Err(AppError::BadRequest(_))
        ));
    }
}
