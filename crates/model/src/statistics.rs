use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
    calories::CalorieDay,
    currency::{CurrencyCode, ExchangeRates},
    decimal::Decimal,
    tip::TipRecord,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TipSummary {
    pub count: usize,
    pub currency_totals: BTreeMap<CurrencyCode, Decimal>,
    /// Sum of the stored base amounts.
    pub total_base: Decimal,
    pub base_currency: CurrencyCode,
    /// Per currency totals in USD, `None` where no rate is known.
    pub usd_equivalents: BTreeMap<CurrencyCode, Option<Decimal>>,
}

impl TipSummary {
    pub fn collect(
        tips: &[TipRecord],
        rates: &ExchangeRates,
        base_currency: &CurrencyCode,
    ) -> Option<TipSummary> {
        if tips.is_empty() {
            return None;
        }

        let mut currency_totals = BTreeMap::new();
        for tip in tips {
            *currency_totals
                .entry(tip.currency.clone())
                .or_insert_with(Decimal::zero) += tip.amount;
        }

        let total_base = tips.iter().filter_map(|tip| tip.base_amount).sum();

        let usd = CurrencyCode::usd();
        let usd_equivalents = currency_totals
            .iter()
            .map(|(code, amount)| (code.clone(), rates.convert(*amount, code, &usd)))
            .collect();

        Some(TipSummary {
            count: tips.len(),
            currency_totals,
            total_base,
            base_currency: base_currency.clone(),
            usd_equivalents,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalorieAverages {
    pub month: Decimal,
    pub year: Decimal,
    pub all_time: Decimal,
}

/// Mean daily total over `[start, end]`, zero when no day falls inside.
pub fn average_over_range(days: &[CalorieDay], start: NaiveDate, end: NaiveDate) -> Decimal {
    Decimal::average(
        days.iter()
            .filter(|day| day.date >= start && day.date <= end)
            .map(|day| day.total_calories),
    )
}
