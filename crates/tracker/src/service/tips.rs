use std::sync::Arc;

use chrono::NaiveDate;
use eyre::{Error, Result};
use log::info;
use model::{
    currency::{CurrencyCode, ExchangeRates},
    errors::TrackerError,
    input::ensure_positive,
    session::Session,
    settings::SortOrder,
    statistics::TipSummary,
    tip::{NewTip, TipFilter, TipRecord, TipUpdate},
};
use mongodb::bson::oid::ObjectId;
use storage::tips::TipStore;
use tx_macro::tx;

use super::currency::Currency;

#[derive(Clone)]
pub struct Tips {
    store: Arc<TipStore>,
    currency: Currency,
}

impl Tips {
    pub(crate) fn new(store: Arc<TipStore>, currency: Currency) -> Self {
        Tips { store, currency }
    }

    /// Records a tip. A tip in the same currency on the same day of the
    /// same user is merged into the existing record.
    #[tx]
    pub async fn add(&self, session: &mut Session, user_id: ObjectId, tip: NewTip) -> Result<ObjectId> {
        ensure_positive(tip.amount)?;
        let existing = self
            .store
            .find_same_day(session, user_id, tip.date, &tip.currency)
            .await?;
        let is_new = existing.is_none();
        let record = merge_tip(
            existing,
            user_id,
            tip,
            &self.currency.rates(),
            &self.currency.base_currency(),
        )?;
        if is_new {
            self.store.insert(session, &record).await?;
        } else {
            self.store.replace(session, &record).await?;
        }
        Ok(record.id)
    }

    /// Applies a partial update. The base amount is always derived again
    /// from the resulting record. A record moved onto a day and currency
    /// that already has a record is merged into that one. `false` when the
    /// tip does not exist.
    #[tx]
    pub async fn update(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        id: ObjectId,
        update: TipUpdate,
    ) -> Result<bool> {
        if let Some(amount) = update.amount {
            ensure_positive(amount)?;
        }
        let mut record = match self.store.get(session, user_id, id).await? {
            Some(record) => record,
            None => return Ok(false),
        };
        let moves = update.moves();
        record.apply(update);

        let target = if moves {
            self.store
                .find_same_day(session, user_id, record.date, &record.currency)
                .await?
        } else {
            None
        };
        let settled = settle_update(
            record,
            target,
            &self.currency.rates(),
            &self.currency.base_currency(),
        )?;
        match settled {
            Settled::Replaced(record) => self.store.replace(session, &record).await,
            Settled::Merged { into, removed } => {
                info!("Merging tip {} into {}", removed, into.id);
                self.store.replace(session, &into).await?;
                self.store.delete(session, user_id, removed).await?;
                Ok(true)
            }
        }
    }

    /// Number of removed records; zero when there was nothing to remove.
    pub async fn delete(&self, session: &mut Session, user_id: ObjectId, id: ObjectId) -> Result<u64> {
        self.store.delete(session, user_id, id).await
    }

    pub async fn get(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        id: ObjectId,
    ) -> Result<Option<TipRecord>> {
        self.store.get(session, user_id, id).await
    }

    pub async fn list(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        filter: &TipFilter,
        order: SortOrder,
    ) -> Result<Vec<TipRecord>> {
        self.store.list(session, user_id, filter, order).await
    }

    pub async fn summary_stats(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Option<TipSummary>> {
        let tips = self
            .list(session, user_id, &TipFilter::range(from, to), SortOrder::Descending)
            .await?;
        Ok(TipSummary::collect(
            &tips,
            &self.currency.rates(),
            &self.currency.base_currency(),
        ))
    }

    /// Rewrites the base amount of every record of every user. Amounts and
    /// currencies are left as they are.
    pub(crate) async fn recalculate_base_amounts(
        &self,
        session: &mut Session,
        rates: &ExchangeRates,
        base: &CurrencyCode,
    ) -> Result<u64, Error> {
        let mut cursor = self.store.cursor(session).await?;
        let mut records = Vec::new();
        while let Some(record) = cursor.next(&mut *session).await {
            records.push(record?);
        }

        let mut updated = 0;
        for mut record in records {
            record.rebase(rates, base);
            self.store
                .set_base_amount(session, record.id, record.base_amount, &record.base_currency)
                .await?;
            updated += 1;
        }
        info!("Recalculated {} base amounts in {}", updated, base);
        Ok(updated)
    }

    /// Fills in base amounts of records written while no rate was known.
    pub(crate) async fn fill_missing_base_amounts(&self, session: &mut Session) -> Result<u64> {
        let records = self.store.without_base_amount(session).await?;
        let filled = fill_missing(
            records,
            &self.currency.rates(),
            &self.currency.base_currency(),
        );
        for record in &filled {
            self.store
                .set_base_amount(session, record.id, record.base_amount, &record.base_currency)
                .await?;
        }
        if !filled.is_empty() {
            info!("Filled in {} missing base amounts", filled.len());
        }
        Ok(filled.len() as u64)
    }
}

/// The record a new tip ends up in: the same-day record grown by it, or a
/// fresh one.
fn merge_tip(
    existing: Option<TipRecord>,
    user_id: ObjectId,
    tip: NewTip,
    rates: &ExchangeRates,
    base: &CurrencyCode,
) -> Result<TipRecord, TrackerError> {
    let mut record = match existing {
        Some(mut record) => {
            record.accumulate(&tip)?;
            record
        }
        None => TipRecord::new(user_id, tip, base.clone()),
    };
    record.rebase(rates, base);
    Ok(record)
}

#[derive(Debug)]
enum Settled {
    Replaced(TipRecord),
    Merged { into: TipRecord, removed: ObjectId },
}

fn settle_update(
    mut record: TipRecord,
    target: Option<TipRecord>,
    rates: &ExchangeRates,
    base: &CurrencyCode,
) -> Result<Settled, TrackerError> {
    match target {
        Some(mut into) if into.id != record.id => {
            into.absorb(&record)?;
            into.rebase(rates, base);
            Ok(Settled::Merged {
                into,
                removed: record.id,
            })
        }
        _ => {
            record.rebase(rates, base);
            Ok(Settled::Replaced(record))
        }
    }
}

/// Records that got a base amount with the given rates.
fn fill_missing(
    records: Vec<TipRecord>,
    rates: &ExchangeRates,
    base: &CurrencyCode,
) -> Vec<TipRecord> {
    records
        .into_iter()
        .filter(|record| record.base_amount.is_none())
        .filter_map(|mut record| {
            record.rebase(rates, base);
            record.base_amount.map(|_| record)
        })
        .collect()
}
