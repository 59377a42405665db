use bson::{doc, to_bson};
use eyre::Error;
use log::info;
use model::{
    currency::CurrencyCode,
    session::Session,
    settings::{AppSettings, ExportSettings, SETTINGS_ID},
};
use mongodb::{options::UpdateOptions, Collection, Database};

const COLLECTION: &str = "settings";

pub struct SettingsStore {
    store: Collection<AppSettings>,
}

impl SettingsStore {
    pub(crate) fn new(db: &Database) -> Self {
        SettingsStore {
            store: db.collection(COLLECTION),
        }
    }

    pub async fn find(&self, session: &mut Session) -> Result<Option<AppSettings>, Error> {
        Ok(self
            .store
            .find_one(doc! { "_id": SETTINGS_ID })
            .session(&mut *session)
            .await?)
    }

    pub async fn get(&self, session: &mut Session) -> Result<AppSettings, Error> {
        Ok(self.find(session).await?.unwrap_or_default())
    }

    pub async fn set_base_currency(
        &self,
        session: &mut Session,
        currency: &CurrencyCode,
    ) -> Result<(), Error> {
        info!("Setting base currency: {}", currency);
        self.store
            .update_one(
                doc! { "_id": SETTINGS_ID },
                doc! { "$set": { "base_currency": currency.as_str() } },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn set_export(
        &self,
        session: &mut Session,
        export: &ExportSettings,
    ) -> Result<(), Error> {
        info!("Setting export preferences: {:?}", export);
        self.store
            .update_one(
                doc! { "_id": SETTINGS_ID },
                doc! { "$set": { "export": to_bson(export)? } },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .session(&mut *session)
            .await?;
        Ok(())
    }
}
