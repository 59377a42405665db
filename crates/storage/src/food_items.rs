use bson::{doc, oid::ObjectId};
use eyre::Error;
use futures_util::TryStreamExt as _;
use log::info;
use model::{
    calories::{FoodItem, Page, Upserted},
    decimal::Decimal,
    session::Session,
};
use mongodb::{
    options::{IndexOptions, UpdateOptions},
    Collection, Database, IndexModel,
};

const COLLECTION: &str = "calorie_items";

pub struct FoodItemStore {
    store: Collection<FoodItem>,
}

impl FoodItemStore {
    pub(crate) async fn new(db: &Database) -> Result<Self, Error> {
        let store = db.collection(COLLECTION);
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        store.create_index(index).await?;
        Ok(FoodItemStore { store })
    }

    /// Sets the calories of the named item, creating it when missing.
    pub async fn upsert(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        name: &str,
        calories: Decimal,
    ) -> Result<Upserted, Error> {
        info!("Saving food item '{}' of user {}: {}", name, user_id, calories);
        let result = self
            .store
            .update_one(
                doc! { "user_id": user_id, "name": name },
                doc! {
                    "$set": { "calories": calories.cents() },
                    "$setOnInsert": { "_id": ObjectId::new() },
                },
            )
            .with_options(UpdateOptions::builder().upsert(true).build())
            .session(&mut *session)
            .await?;
        Ok(if result.upserted_id.is_some() {
            Upserted::Inserted
        } else {
            Upserted::Updated
        })
    }

    pub async fn get_by_name(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        name: &str,
    ) -> Result<Option<FoodItem>, Error> {
        Ok(self
            .store
            .find_one(doc! { "user_id": user_id, "name": name })
            .session(&mut *session)
            .await?)
    }

    pub async fn page(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        page: Page,
    ) -> Result<Vec<FoodItem>, Error> {
        let mut cursor = self
            .store
            .find(doc! { "user_id": user_id })
            .sort(doc! { "name": 1 })
            .skip(page.offset())
            .limit(page.limit())
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn all(&self, session: &mut Session, user_id: ObjectId) -> Result<Vec<FoodItem>, Error> {
        let mut cursor = self
            .store
            .find(doc! { "user_id": user_id })
            .sort(doc! { "name": 1 })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn count(&self, session: &mut Session, user_id: ObjectId) -> Result<u64, Error> {
        Ok(self
            .store
            .count_documents(doc! { "user_id": user_id })
            .session(&mut *session)
            .await?)
    }

    pub async fn delete(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        id: ObjectId,
    ) -> Result<u64, Error> {
        info!("Deleting food item {} of user {}", id, user_id);
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
}
