use bson::{doc, oid::ObjectId, to_bson, Document};
use chrono::NaiveDate;
use eyre::Error;
use futures_util::TryStreamExt as _;
use log::info;
use model::{
    currency::CurrencyCode,
    decimal::Decimal,
    session::Session,
    settings::SortOrder,
    tip::{TipFilter, TipRecord},
};
use mongodb::{Collection, Database, IndexModel, SessionCursor};

use crate::filter::{contains_ignore_case, date_key, date_range};

const COLLECTION: &str = "tips";

pub struct TipStore {
    store: Collection<TipRecord>,
}

impl TipStore {
    pub(crate) async fn new(db: &Database) -> Result<Self, Error> {
        let store = db.collection(COLLECTION);
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "date": -1 })
                    .build(),
            )
            .await?;
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "currency": 1 })
                    .build(),
            )
            .await?;
        Ok(TipStore { store })
    }

    pub async fn insert(&self, session: &mut Session, tip: &TipRecord) -> Result<(), Error> {
        info!(
            "Inserting tip {} {} for user {} on {}",
            tip.amount, tip.currency, tip.user_id, tip.date
        );
        self.store.insert_one(tip).session(&mut *session).await?;
        Ok(())
    }

    pub async fn get(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        id: ObjectId,
    ) -> Result<Option<TipRecord>, Error> {
        Ok(self
            .store
            .find_one(doc! { "_id": id, "user_id": user_id })
            .session(&mut *session)
            .await?)
    }

    /// Record of the same user, day and currency a new tip merges into.
    pub async fn find_same_day(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        date: NaiveDate,
        currency: &CurrencyCode,
    ) -> Result<Option<TipRecord>, Error> {
        Ok(self
            .store
            .find_one(doc! {
                "user_id": user_id,
                "date": date_key(date),
                "currency": currency.as_str(),
            })
            .session(&mut *session)
            .await?)
    }

    /// Replaces the whole record. Returns whether it existed.
    pub async fn replace(&self, session: &mut Session, tip: &TipRecord) -> Result<bool, Error> {
        info!("Updating tip {} of user {}", tip.id, tip.user_id);
        let result = self
            .store
            .replace_one(doc! { "_id": tip.id, "user_id": tip.user_id }, tip)
            .session(&mut *session)
            .await?;
        Ok(result.matched_count == 1)
    }

    pub async fn set_base_amount(
        &self,
        session: &mut Session,
        id: ObjectId,
        base_amount: Option<Decimal>,
        base_currency: &CurrencyCode,
    ) -> Result<(), Error> {
        self.store
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "base_amount": to_bson(&base_amount)?,
                    "base_currency": base_currency.as_str(),
                } },
            )
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn delete(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        id: ObjectId,
    ) -> Result<u64, Error> {
        info!("Deleting tip {} of user {}", id, user_id);
        let result = self
            .store
            .delete_one(doc! { "_id": id, "user_id": user_id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count)
    }

    pub async fn delete_by_user(&self, session: &mut Session, user_id: ObjectId) -> Result<u64, Error> {
        let result = self
            .store
            .delete_many(doc! { "user_id": user_id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count)
    }

    pub async fn list(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        filter: &TipFilter,
        order: SortOrder,
    ) -> Result<Vec<TipRecord>, Error> {
        let mut cursor = self
            .store
            .find(tip_query(user_id, filter))
            .sort(doc! { "date": order.direction(), "created_at": order.direction() })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    /// Records stored while their currency had no known rate.
    pub async fn without_base_amount(&self, session: &mut Session) -> Result<Vec<TipRecord>, Error> {
        let mut cursor = self
            .store
            .find(doc! { "base_amount": null })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    /// Every record of every user.
    pub async fn cursor(&self, session: &mut Session) -> Result<SessionCursor<TipRecord>, Error> {
        Ok(self.store.find(doc! {}).session(&mut *session).await?)
    }
}

fn tip_query(user_id: ObjectId, filter: &TipFilter) -> Document {
    let mut query = doc! { "user_id": user_id };
    if let Some(range) = date_range(filter.from, filter.to) {
        query.insert("date", range);
    }
    if let Some(currency) = &filter.currency {
        query.insert("currency", currency.as_str());
    }
    if let Some(location) = filter.location.as_deref().map(str::trim) {
        if !location.is_empty() {
            query.insert("location", contains_ignore_case(location));
        }
    }
    query
}
