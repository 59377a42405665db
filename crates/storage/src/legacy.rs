//! Read access to the per-user collections older deployments created
//! (`user_<id>_calories`, `user_<id>_calorie_items`).

use bson::{doc, oid::ObjectId, Document};
use chrono::NaiveDate;
use eyre::Error;
use futures_util::TryStreamExt as _;
use log::{info, warn};
use model::{decimal::Decimal, input::parse_date, session::Session};
use mongodb::{Collection, Database};

use crate::filter::number;

pub fn calories_collection(user_id: ObjectId) -> String {
    format!("user_{}_calories", user_id.to_hex())
}

pub fn calorie_items_collection(user_id: ObjectId) -> String {
    format!("user_{}_calorie_items", user_id.to_hex())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyDay {
    pub date: NaiveDate,
    pub total_calories: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyItem {
    pub name: String,
    pub calories: Decimal,
}

pub struct LegacyStore {
    db: Database,
}

impl LegacyStore {
    pub(crate) fn new(db: &Database) -> Self {
        LegacyStore { db: db.clone() }
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    pub async fn exists(&self, session: &mut Session, user_id: ObjectId) -> Result<bool, Error> {
        let names = self
            .db
            .list_collection_names()
            .session(&mut *session)
            .await?;
        let calories = calories_collection(user_id);
        let items = calorie_items_collection(user_id);
        Ok(names.iter().any(|name| *name == calories || *name == items))
    }

    pub async fn days(&self, session: &mut Session, user_id: ObjectId) -> Result<Vec<LegacyDay>, Error> {
        let docs = self.read(session, &calories_collection(user_id)).await?;
        Ok(docs.iter().filter_map(legacy_day).collect())
    }

    pub async fn items(
        &self,
        session: &mut Session,
        user_id: ObjectId,
    ) -> Result<Vec<LegacyItem>, Error> {
        let docs = self.read(session, &calorie_items_collection(user_id)).await?;
        Ok(docs.iter().filter_map(legacy_item).collect())
    }

    pub async fn drop_collections(
        &self,
        session: &mut Session,
        user_id: ObjectId,
    ) -> Result<(), Error> {
        for name in [calories_collection(user_id), calorie_items_collection(user_id)] {
            info!("Dropping legacy collection {}", name);
            self.collection(&name)
                .drop()
                .session(&mut *session)
                .await?;
        }
        Ok(())
    }

    async fn read(&self, session: &mut Session, name: &str) -> Result<Vec<Document>, Error> {
        let mut cursor = self
            .collection(name)
            .find(doc! {})
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }
}

fn legacy_day(doc: &Document) -> Option<LegacyDay> {
    let date = doc.get_str("date").ok().and_then(|date| parse_date(date).ok());
    let total = number(doc.get("total_calories")).and_then(Decimal::try_from_f64);
    match (date, total) {
        (Some(date), Some(total_calories)) => Some(LegacyDay {
            date,
            total_calories,
        }),
        _ => {
            warn!("Skipping malformed legacy calorie entry: {}", doc);
            None
        }
    }
}

fn legacy_item(doc: &Document) -> Option<LegacyItem> {
    let name = doc.get_str("food_item").ok().map(str::trim);
    let calories = number(doc.get("calorie_amount")).and_then(Decimal::try_from_f64);
    match (name, calories) {
        (Some(name), Some(calories)) if !name.is_empty() => Some(LegacyItem {
            name: name.to_owned(),
            calories,
        }),
        _ => {
            warn!("Skipping malformed legacy food item: {}", doc);
            None
        }
    }
}
