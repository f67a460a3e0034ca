use serde::{Deserialize, Serialize};

use crate::{currency::CurrencyCode, errors::ValidationError};

use super::period::Period;

/// User preferences for budget warnings and the savings goal.
///
/// Field names are camelCase on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub budget_warning: Option<f64>,
    #[serde(default)]
    pub budget_period: Period,
    #[serde(default)]
    pub income: Option<f64>,
    /// Percentage of income to keep, 0 to 100.
    #[serde(default)]
    pub save_target: Option<f64>,
    #[serde(default)]
    pub save_period: Period,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::default(),
            budget_warning: None,
            budget_period: Period::Month,
            income: None,
            save_target: None,
            save_period: Period::Month,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.currency.validate()?;
        if let Some(limit) = self.budget_warning {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(ValidationError::OutOfRange {
                    field: "budgetWarning",
                    expected: "a positive number",
                    value: limit,
                });
            }
        }
        if let Some(income) = self.income {
            if !income.is_finite() || income < 0.0 {
                return Err(ValidationError::OutOfRange {
                    field: "income",
                    expected: "zero or more",
                    value: income,
                });
            }
        }
        if let Some(target) = self.save_target {
            if !(0.0..=100.0).contains(&target) {
                return Err(ValidationError::OutOfRange {
                    field: "saveTarget",
                    expected: "a percentage between 0 and 100",
                    value: target,
                });
            }
        }
        Ok(())
    }

    /// Updates one field from its textual form. An empty value or `none`
    /// clears optional fields.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        match normalize_key(key).as_str() {
            "currency" => self.currency = CurrencyCode::parse(value)?,
            "budgetwarning" => self.budget_warning = parse_optional("budgetWarning", value)?,
            "budgetperiod" => self.budget_period = value.parse()?,
            "income" => self.income = parse_optional("income", value)?,
            "savetarget" => self.save_target = parse_optional("saveTarget", value)?,
            "saveperiod" => self.save_period = value.parse()?,
            _ => return Err(ValidationError::UnknownSetting(key.to_string())),
        }
        Ok(())
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn parse_optional(field: &'static str, value: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}
