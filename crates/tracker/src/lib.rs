use std::sync::Arc;

use eyre::Result;
use exchange::RatesApi;
use log::{info, warn};
use model::{
    currency::{CurrencyCode, ExchangeRates},
    errors::TrackerError,
    session::Session,
    settings::{AppSettings, ExportSettings},
};
use service::{
    calories::Calories,
    currency::{Currency, RatesSource}, export::Export, food_items::FoodItems, tips::Tips,
    users::Users,
};
use storage::{session::Db, settings::SettingsStore, Storage};
use tx_macro::tx;

pub mod service;

#[derive(Clone)]
pub struct Tracker {
    pub db: Db,
    pub users: Users,
    pub tips: Tips,
    pub calories: Calories,
    pub food_items: FoodItems,
    pub currency: Currency,
    pub export: Export,
    settings: Arc<SettingsStore>,
}

impl Tracker {
    pub fn new(storage: Storage, api: RatesApi) -> Self {
        let currency = Currency::new(storage.rates, storage.settings.clone(), api);
        let tips = Tips::new(storage.tips.clone(), currency.clone());
        let calories = Calories::new(storage.calories.clone());
        let food_items = FoodItems::new(storage.food_items.clone(), calories.clone());
        let users = Users::new(
            storage.users,
            storage.tips,
            storage.calories,
            storage.food_items,
            storage.legacy,
        );
        let export = Export::new(
            tips.clone(),
            calories.clone(),
            food_items.clone(),
            storage.settings.clone(),
        );
        Tracker {
            db: storage.db,
            users,
            tips,
            calories,
            food_items,
            currency,
            export,
            settings: storage.settings,
        }
    }

    /// Stores `default_base` when no settings exist yet, then loads the
    /// base currency and the cached rates.
    pub async fn init(&self, session: &mut Session, default_base: &CurrencyCode) -> Result<()> {
        if self.settings.find(session).await?.is_none() {
            info!("No settings stored, using {} as base currency", default_base);
            self.settings.set_base_currency(session, default_base).await?;
        }
        self.currency.load(session).await
    }

    pub async fn settings(&self, session: &mut Session) -> Result<AppSettings> {
        self.settings.get(session).await
    }

    pub async fn set_export_settings(
        &self,
        session: &mut Session,
        export: &ExportSettings,
    ) -> Result<()> {
        self.settings.set_export(session, export).await
    }

    /// Switches the base currency and rewrites the base amount of every
    /// stored tip. Returns the number of rewritten records.
    pub async fn set_base_currency(
        &self,
        session: &mut Session,
        currency: CurrencyCode,
    ) -> Result<u64> {
        let rates = self.currency.rates();
        check_base_currency(&rates, &currency)?;
        let updated = self.apply_base_currency(session, &currency, &rates).await?;
        self.currency.set_base(currency);
        Ok(updated)
    }

    #[tx]
    async fn apply_base_currency(
        &self,
        session: &mut Session,
        currency: &CurrencyCode,
        rates: &ExchangeRates,
    ) -> Result<u64> {
        self.settings.set_base_currency(session, currency).await?;
        self.tips
            .recalculate_base_amounts(session, rates, currency)
            .await
    }

    /// Refreshes exchange rates. Fresh remote rates also fill in base
    /// amounts of tips written while their currency had no rate. A failed
    /// fill is only logged.
    pub async fn refresh_rates(&self, session: &mut Session) -> RatesSource {
        let source = self.currency.refresh(session).await;
        if source == RatesSource::Remote {
            if let Err(err) = self.tips.fill_missing_base_amounts(session).await {
                warn!("Failed to fill in missing base amounts: {:#}", err);
            }
        }
        source
    }

    /// Rewrites base amounts with the current rates and base currency.
    pub async fn recalculate_base_amounts(&self, session: &mut Session) -> Result<u64> {
        let base = self.currency.base_currency();
        let rates = self.currency.rates();
        self.apply_base_currency(session, &base, &rates).await
    }
}

/// A base currency has to be in the loaded rate table. Without any rates
/// every code is accepted.
fn check_base_currency(rates: &ExchangeRates, currency: &CurrencyCode) -> Result<(), TrackerError> {
    if !rates.is_empty() && !rates.contains(currency) {
        return Err(TrackerError::UnknownCurrency(currency.to_string()));
    }
    Ok(())
}
