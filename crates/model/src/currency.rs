use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{decimal::Decimal, errors::TrackerError};

pub const USD: &str = "USD";
pub const RATES_ID: &str = "exchange_rates";
pub const DEFAULT_CURRENCIES: [&str; 8] = ["USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY"];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn usd() -> CurrencyCode {
        CurrencyCode(USD.to_owned())
    }

    pub fn is_usd(&self) -> bool {
        self.0 == USD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        CurrencyCode::usd()
    }
}

impl FromStr for CurrencyCode {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(CurrencyCode(code))
        } else {
            Err(TrackerError::invalid(format!(
                "'{}' is not a currency code",
                s
            )))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rates relative to USD, as served by the exchange-rate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExchangeRates {
    #[serde(rename = "_id", default = "rates_id")]
    pub id: String,
    pub rates: BTreeMap<String, f64>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated: DateTime<Utc>,
}

fn rates_id() -> String {
    RATES_ID.to_owned()
}

impl ExchangeRates {
    pub fn new(rates: BTreeMap<String, f64>, updated: DateTime<Utc>) -> ExchangeRates {
        ExchangeRates {
            id: rates_id(),
            rates,
            updated,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        if code.is_usd() {
            return Some(self.rates.get(USD).copied().unwrap_or(1.0));
        }
        self.rates
            .get(code.as_str())
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.rate(code).is_some()
    }

    /// Converts through USD. `None` when no rates are loaded or one of the
    /// currencies is missing from the table. Same-currency conversion is
    /// exact and needs no rates.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Option<Decimal> {
        if from == to {
            return Some(amount);
        }
        if self.is_empty() {
            return None;
        }

        let value = amount.as_f64();
        let converted = if from.is_usd() {
            value * self.rate(to)?
        } else if to.is_usd() {
            value / self.rate(from)?
        } else {
            value / self.rate(from)? * self.rate(to)?
        };
        Decimal::try_from_f64(converted)
    }

    pub fn currencies(&self) -> Vec<CurrencyCode> {
        if self.is_empty() {
            return default_currencies();
        }
        self.rates
            .keys()
            .filter_map(|code| code.parse().ok())
            .collect()
    }
}

pub fn default_currencies() -> Vec<CurrencyCode> {
    DEFAULT_CURRENCIES
        .iter()
        .map(|code| CurrencyCode(code.to_string()))
        .collect()
}
