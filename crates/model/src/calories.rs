use bson::oid::ObjectId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{decimal::Decimal, settings::SortOrder};

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 1000;

/// Running calorie total of one user for one calendar day.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CalorieDay {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub date: NaiveDate,
    pub total_calories: Decimal,
}

/// Named food with its calories per unit, used to log repeated meals.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FoodItem {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub name: String,
    pub calories: Decimal,
}

impl FoodItem {
    pub fn new(user_id: ObjectId, name: String, calories: Decimal) -> FoodItem {
        FoodItem {
            id: ObjectId::new(),
            user_id,
            name,
            calories,
        }
    }

    /// `None` when the product does not fit.
    pub fn calories_for(&self, servings: Decimal) -> Option<Decimal> {
        self.calories.checked_mul(servings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Updated,
}

/// One based page number with a page size in `1..=MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u64,
    per_page: u64,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            number: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    pub fn new(number: u64, per_page: u64) -> Page {
        Page {
            number: number.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Documents to skip, capped at what the server accepts.
    pub fn offset(&self) -> u64 {
        (self.number - 1)
            .saturating_mul(self.per_page)
            .min(i64::MAX as u64)
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalorieRange {
    All,
    Between(NaiveDate, NaiveDate),
}

#[derive(Debug, Clone, Copy)]
pub struct CalorieQuery {
    pub range: CalorieRange,
    pub order: SortOrder,
    pub page: Page,
}

impl Default for CalorieQuery {
    fn default() -> Self {
        CalorieQuery {
            range: CalorieRange::All,
            order: SortOrder::Ascending,
            page: Page::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub entries: Vec<T>,
    pub page: u64,
    pub total_pages: u64,
}
