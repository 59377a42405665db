use std::sync::Arc;

use chrono::NaiveDate;
use eyre::Result;
use log::info;
use model::{
    calories::{FoodItem, Page, Paged, Upserted},
    decimal::Decimal,
    errors::TrackerError,
    input::MAX_AMOUNT,
    session::Session,
};
use mongodb::bson::oid::ObjectId;
use storage::food_items::FoodItemStore;
use tx_macro::tx;

use super::calories::Calories;

#[derive(Clone)]
pub struct FoodItems {
    store: Arc<FoodItemStore>,
    calories: Calories,
}

impl FoodItems {
    pub(crate) fn new(store: Arc<FoodItemStore>, calories: Calories) -> Self {
        FoodItems { store, calories }
    }

    /// Creates the item or overwrites the calories of an item with the
    /// same name.
    pub async fn upsert(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        name: &str,
        calories: Decimal,
    ) -> Result<Upserted> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::invalid("food item name must not be empty").into());
        }
        if calories.is_negative() || calories > MAX_AMOUNT {
            return Err(TrackerError::invalid(format!(
                "calories must be between 0 and {}, got {}",
                MAX_AMOUNT, calories
            ))
            .into());
        }
        self.store.upsert(session, user_id, name, calories).await
    }

    pub async fn get(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        name: &str,
    ) -> Result<Option<FoodItem>> {
        self.store.get_by_name(session, user_id, name.trim()).await
    }

    pub async fn list(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        page: Page,
    ) -> Result<Paged<FoodItem>> {
        let total = self.store.count(session, user_id).await?;
        let entries = self.store.page(session, user_id, page).await?;
        Ok(Paged {
            entries,
            page: page.number(),
            total_pages: page.total_pages(total),
        })
    }

    pub async fn all(&self, session: &mut Session, user_id: ObjectId) -> Result<Vec<FoodItem>> {
        self.store.all(session, user_id).await
    }

    pub async fn delete(&self, session: &mut Session, user_id: ObjectId, id: ObjectId) -> Result<u64> {
        self.store.delete(session, user_id, id).await
    }

    /// Adds `servings` of a saved item to the total of `date` (today when
    /// not given) and returns the calories added.
    #[tx]
    pub async fn log_servings(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        name: &str,
        servings: Decimal,
        date: Option<NaiveDate>,
    ) -> Result<Decimal> {
        let date = date.unwrap_or_else(dates::today);
        if !servings.is_positive() {
            return Err(TrackerError::invalid(format!(
                "servings must be positive, got {}",
                servings
            ))
            .into());
        }
        let item = self
            .store
            .get_by_name(session, user_id, name.trim())
            .await?
            .ok_or_else(|| TrackerError::FoodItemNotFound(name.trim().to_owned()))?;
        let calories = item
            .calories_for(servings)
            .filter(|calories| *calories <= MAX_AMOUNT)
            .ok_or_else(|| {
                TrackerError::invalid(format!(
                    "{} servings of '{}' is too much",
                    servings, item.name
                ))
            })?;
        info!("Logging {} x '{}' ({}) on {}", servings, item.name, calories, date);
        if calories.is_positive() {
            self.calories.add(session, user_id, date, calories).await?;
        }
        Ok(calories)
    }
}
