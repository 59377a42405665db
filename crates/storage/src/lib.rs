pub mod calories;
pub mod filter;
pub mod food_items;
pub mod legacy;
pub mod rates;
pub mod session;
pub mod settings;
pub mod tips;
pub mod users;

use std::sync::Arc;

use calories::CalorieStore;
use eyre::Result;
use food_items::FoodItemStore;
use legacy::LegacyStore;
use rates::RatesStore;
use session::Db;
use settings::SettingsStore;
use tips::TipStore;
use users::UserStore;

#[derive(Clone)]
pub struct Storage {
    pub db: Db,
    pub users: Arc<UserStore>,
    pub tips: Arc<TipStore>,
    pub calories: Arc<CalorieStore>,
    pub food_items: Arc<FoodItemStore>,
    pub rates: Arc<RatesStore>,
    pub settings: Arc<SettingsStore>,
    pub legacy: Arc<LegacyStore>,
}

impl Storage {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let db = Db::new(uri, db_name).await?;
        let users = Arc::new(UserStore::new(&db).await?);
        let tips = Arc::new(TipStore::new(&db).await?);
        let calories = Arc::new(CalorieStore::new(&db).await?);
        let food_items = Arc::new(FoodItemStore::new(&db).await?);
        let rates = Arc::new(RatesStore::new(&db));
        let settings = Arc::new(SettingsStore::new(&db));
        let legacy = Arc::new(LegacyStore::new(&db));

        Ok(Storage {
            db,
            users,
            tips,
            calories,
            food_items,
            rates,
            settings,
            legacy,
        })
    }
}
