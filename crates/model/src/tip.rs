use bson::oid::ObjectId;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    currency::{CurrencyCode, ExchangeRates},
    decimal::Decimal,
    errors::TrackerError,
    input::MAX_AMOUNT,
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TipRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub location: String,
    /// `amount` in `base_currency`, `None` when no rate was available.
    #[serde(default)]
    pub base_amount: Option<Decimal>,
    pub base_currency: CurrencyCode,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl TipRecord {
    pub fn new(user_id: ObjectId, tip: NewTip, base_currency: CurrencyCode) -> TipRecord {
        TipRecord {
            id: ObjectId::new(),
            user_id,
            amount: tip.amount,
            currency: tip.currency,
            date: tip.date,
            notes: tip.notes,
            location: tip.location,
            base_amount: None,
            base_currency,
            created_at: Utc::now(),
        }
    }

    /// Another tip for the same day and currency: the amount adds up,
    /// notes are appended and a missing location is filled in.
    pub fn accumulate(&mut self, tip: &NewTip) -> Result<(), TrackerError> {
        self.merge(tip.amount, &tip.notes, &tip.location)
    }

    /// Folds a record that landed on the same day and currency into this one.
    pub fn absorb(&mut self, other: &TipRecord) -> Result<(), TrackerError> {
        self.merge(other.amount, &other.notes, &other.location)
    }

    fn merge(&mut self, amount: Decimal, notes: &str, location: &str) -> Result<(), TrackerError> {
        let total = self
            .amount
            .checked_add(amount)
            .filter(|total| *total <= MAX_AMOUNT)
            .ok_or_else(|| {
                TrackerError::invalid(format!(
                    "total of {} and {} exceeds {}",
                    self.amount, amount, MAX_AMOUNT
                ))
            })?;
        self.amount = total;
        let notes = notes.trim();
        if !notes.is_empty() {
            if self.notes.trim().is_empty() {
                self.notes = notes.to_owned();
            } else if !self.notes.split("; ").any(|n| n == notes) {
                self.notes = format!("{}; {}", self.notes, notes);
            }
        }
        if self.location.trim().is_empty() && !location.trim().is_empty() {
            self.location = location.trim().to_owned();
        }
        Ok(())
    }

    pub fn apply(&mut self, update: TipUpdate) {
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(currency) = update.currency {
            self.currency = currency;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
    }

    /// Derives `base_amount` from the current amount, currency and base.
    pub fn rebase(&mut self, rates: &ExchangeRates, base_currency: &CurrencyCode) {
        self.base_amount = rates.convert(self.amount, &self.currency, base_currency);
        self.base_currency = base_currency.clone();
    }
}

#[derive(Debug, Clone)]
pub struct NewTip {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    pub notes: String,
    pub location: String,
}

impl NewTip {
    /// Tip dated today (local time) with no notes or location.
    pub fn today(amount: Decimal, currency: CurrencyCode) -> NewTip {
        NewTip {
            amount,
            currency,
            date: Local::now().date_naive(),
            notes: String::new(),
            location: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TipUpdate {
    pub amount: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub location: Option<String>,
}

impl TipUpdate {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.currency.is_none()
            && self.date.is_none()
            && self.notes.is_none()
            && self.location.is_none()
    }

    /// Whether the update can move the record to another day or currency.
    pub fn moves(&self) -> bool {
        self.date.is_some() || self.currency.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TipFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub currency: Option<CurrencyCode>,
    /// Case insensitive substring of the location.
    pub location: Option<String>,
}

impl TipFilter {
    pub fn range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> TipFilter {
        TipFilter {
            from,
            to,
            ..Default::default()
        }
    }
}
