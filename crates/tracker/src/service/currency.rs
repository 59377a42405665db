use std::sync::Arc;

use chrono::{DateTime, Utc};
use eyre::Error;
use exchange::RatesApi;
use log::{info, warn};
use model::{
    currency::{CurrencyCode, ExchangeRates},
    decimal::Decimal,
    session::Session,
};
use parking_lot::RwLock;
use storage::{rates::RatesStore, settings::SettingsStore};

/// Where the rates in use after a refresh came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatesSource {
    Remote,
    Cached,
    Unavailable,
}

/// Process wide exchange-rate table and base currency.
#[derive(Clone)]
pub struct Currency {
    rates: Arc<RwLock<ExchangeRates>>,
    base: Arc<RwLock<CurrencyCode>>,
    store: Arc<RatesStore>,
    settings: Arc<SettingsStore>,
    api: RatesApi,
}

impl Currency {
    pub(crate) fn new(store: Arc<RatesStore>, settings: Arc<SettingsStore>, api: RatesApi) -> Self {
        Currency {
            rates: Arc::new(RwLock::new(ExchangeRates::default())),
            base: Arc::new(RwLock::new(CurrencyCode::default())),
            store,
            settings,
            api,
        }
    }

    /// Loads the stored base currency and the cached snapshot.
    pub async fn load(&self, session: &mut Session) -> Result<(), Error> {
        let settings = self.settings.get(session).await?;
        *self.base.write() = settings.base_currency;
        if let Some(rates) = self.store.get(session).await? {
            info!("Loaded cached exchange rates from {}", rates.updated);
            *self.rates.write() = rates;
        }
        Ok(())
    }

    /// Pulls fresh rates. Failures are logged and the cached snapshot is
    /// used instead.
    pub async fn refresh(&self, session: &mut Session) -> RatesSource {
        match self.api.fetch().await {
            Ok(rates) => {
                let snapshot = ExchangeRates::new(rates, Utc::now());
                if let Err(err) = self.store.replace(session, &snapshot).await {
                    warn!("Failed to store exchange rates: {:#}", err);
                }
                info!("Exchange rates updated: {} currencies", snapshot.rates.len());
                *self.rates.write() = snapshot;
                RatesSource::Remote
            }
            Err(err) => {
                warn!("Failed to update exchange rates: {:#}", err);
                match self.store.get(session).await {
                    Ok(Some(cached)) => *self.rates.write() = cached,
                    Ok(None) => {}
                    Err(err) => warn!("Failed to load cached exchange rates: {:#}", err),
                }
                if self.rates.read().is_empty() {
                    RatesSource::Unavailable
                } else {
                    RatesSource::Cached
                }
            }
        }
    }

    pub fn rates(&self) -> ExchangeRates {
        self.rates.read().clone()
    }

    /// Installs a rate table without touching the network or the store.
    pub fn use_rates(&self, rates: ExchangeRates) {
        *self.rates.write() = rates;
    }

    pub fn rates_updated_at(&self) -> Option<DateTime<Utc>> {
        let rates = self.rates.read();
        if rates.is_empty() {
            None
        } else {
            Some(rates.updated)
        }
    }

    pub fn convert(&self, amount: Decimal, from: &CurrencyCode, to: &CurrencyCode) -> Option<Decimal> {
        self.rates.read().convert(amount, from, to)
    }

    pub fn convert_to_base(&self, amount: Decimal, currency: &CurrencyCode) -> Option<Decimal> {
        let base = self.base_currency();
        self.convert(amount, currency, &base)
    }

    pub fn base_currency(&self) -> CurrencyCode {
        self.base.read().clone()
    }

    pub(crate) fn set_base(&self, currency: CurrencyCode) {
        *self.base.write() = currency;
    }

    pub fn available_currencies(&self) -> Vec<CurrencyCode> {
        self.rates.read().currencies()
    }
}
