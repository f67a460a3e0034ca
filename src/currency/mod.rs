//! Currency labels and display formatting. No conversion: the code is a label only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// ISO 4217 currency code, stored upper-case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Builds a code, rejecting anything that is not three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let candidate = Self::new(code);
        candidate.validate()?;
        Ok(candidate)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.0.len() == 3 && self.0.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(())
        } else {
            Err(ValidationError::InvalidCurrency(self.0.clone()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn minor_units_for(code: &str) -> u8 {
    match code {
        "JPY" | "KRW" => 0,
        "KWD" | "BHD" => 3,
        _ => 2,
    }
}

/// Renders `amount` as `<CODE> <grouped amount>`, e.g. `USD 1,234.50`.
pub fn format_amount(amount: f64, code: &CurrencyCode) -> String {
    if !amount.is_finite() {
        return format!("{} {}", code, amount);
    }
    let precision = minor_units_for(code.as_str()) as usize;
    let body = format!("{:.*}", precision, amount.abs());
    let (int_part, fraction) = match body.find('.') {
        Some(pos) => body.split_at(pos),
        None => (body.as_str(), ""),
    };
    let sign = if amount < 0.0 && body.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    format!("{} {}{}{}", code, sign, group_digits(int_part, ','), fraction)
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_upper_cased() {
        assert_eq!(CurrencyCode::new(" eur ").as_str(), "EUR");
    }

    #[test]
    fn parse_rejects_malformed_codes() {
        assert!(CurrencyCode::parse("usd").is_ok());
        assert!(matches!(
            CurrencyCode::parse("dollars"),
            Err(ValidationError::InvalidCurrency(_))
        ));
        assert!(CurrencyCode::parse("U5D").is_err());
    }

    #[test]
    fn formats_with_grouping_and_minor_units() {
        let usd = CurrencyCode::default();
        assert_eq!(format_amount(1234.5, &usd), "USD 1,234.50");
        assert_eq!(format_amount(0.0, &usd), "USD 0.00");
        assert_eq!(format_amount(-42.0, &usd), "USD -42.00");
        assert_eq!(format_amount(1500.0, &CurrencyCode::new("JPY")), "JPY 1,500");
    }

    #[test]
    fn non_finite_amounts_render_verbatim() {
        assert_eq!(format_amount(f64::NAN, &CurrencyCode::default()), "USD NaN");
    }
}
