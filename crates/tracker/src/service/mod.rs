pub mod calories;
pub mod currency;
pub mod export;
pub mod food_items;
pub mod password;
pub mod tips;
pub mod users;
