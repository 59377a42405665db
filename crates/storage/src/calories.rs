use bson::{doc, oid::ObjectId, Document};
use chrono::NaiveDate;
use eyre::Error;
use futures_util::TryStreamExt as _;
use log::info;
use model::{
    calories::{CalorieDay, CalorieQuery, CalorieRange},
    decimal::Decimal,
    session::Session,
    settings::SortOrder,
};
use mongodb::{
    options::{IndexOptions, UpdateOptions},
    Collection, Database, IndexModel,
};

use crate::filter::{date_key, date_range};

const COLLECTION: &str = "calories";

pub struct CalorieStore {
    store: Collection<CalorieDay>,
}

impl CalorieStore {
    pub(crate) async fn new(db: &Database) -> Result<Self, Error> {
        let store = db.collection(COLLECTION);
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "date": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        store.create_index(index).await?;
        Ok(CalorieStore { store })
    }

    /// Adds to the day's running total, creating the day on first use.
    pub async fn add(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        date: NaiveDate,
        calories: Decimal,
    ) -> Result<(), Error> {
        info!("Adding {} calories for user {} on {}", calories, user_id, date);
        self.store
            .update_one(
                doc! { "user_id": user_id, "date": date_key(date) },
                doc! {
                    "$inc": { "total_calories": calories.cents() },
                    "$setOnInsert": { "_id": ObjectId::new() },
                },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn get(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        date: NaiveDate,
    ) -> Result<Option<CalorieDay>, Error> {
        Ok(self
            .store
            .find_one(doc! { "user_id": user_id, "date": date_key(date) })
            .session(&mut *session)
            .await?)
    }

    pub async fn delete_day(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        date: NaiveDate,
    ) -> Result<u64, Error> {
        info!("Deleting calories of user {} on {}", user_id, date);
        let result = self
            .store
            .delete_one(doc! { "user_id": user_id, "date": date_key(date) })
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

    pub async fn count(&self, session: &mut Session, user_id: ObjectId) -> Result<u64, Error> {
        Ok(self
            .store
            .count_documents(doc! { "user_id": user_id })
            .session(&mut *session)
            .await?)
    }

    pub async fn page(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        query: &CalorieQuery,
    ) -> Result<Vec<CalorieDay>, Error> {
        let mut cursor = self
            .store
            .find(range_query(user_id, query.range))
            .sort(doc! { "date": query.order.direction() })
            .skip(query.page.offset())
            .limit(query.page.limit())
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    /// All days in the range, oldest first.
    pub async fn range(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        range: CalorieRange,
    ) -> Result<Vec<CalorieDay>, Error> {
        let mut cursor = self
            .store
            .find(range_query(user_id, range))
            .sort(doc! { "date": SortOrder::Ascending.direction() })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }
}

fn range_query(user_id: ObjectId, range: CalorieRange) -> Document {
    let mut query = doc! { "user_id": user_id };
    if let CalorieRange::Between(from, to) = range {
        if let Some(range) = date_range(Some(from), Some(to)) {
            query.insert("date", range);
        }
    }
    query
}
