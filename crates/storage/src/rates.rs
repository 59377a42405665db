use bson::doc;
use eyre::Error;
use log::info;
use model::{
    currency::{ExchangeRates, RATES_ID},
    session::Session,
};
use mongodb::{Collection, Database};

const COLLECTION: &str = "currencies";

/// Last fetched exchange-rate table, kept for offline use.
pub struct RatesStore {
    store: Collection<ExchangeRates>,
}

impl RatesStore {
    pub(crate) fn new(db: &Database) -> Self {
        RatesStore {
            store: db.collection(COLLECTION),
        }
    }

    pub async fn get(&self, session: &mut Session) -> Result<Option<ExchangeRates>, Error> {
        Ok(self
            .store
            .find_one(doc! { "_id": RATES_ID })
            .session(&mut *session)
            .await?)
    }

    /// Swaps the stored snapshot for `rates` as a whole.
    pub async fn replace(&self, session: &mut Session, rates: &ExchangeRates) -> Result<(), Error> {
        info!(
            "Storing {} exchange rates updated at {}",
            rates.rates.len(),
            rates.updated
        );
        self.store
            .replace_one(doc! { "_id": RATES_ID }, rates)
            .upsert(true)
            .session(&mut *session)
            .await?;
        Ok(())
    }
}
