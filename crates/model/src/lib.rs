pub mod calories;
pub mod currency;
pub mod decimal;
pub mod errors;
pub mod input;
pub mod session;
pub mod settings;
pub mod statistics;
pub mod tip;
pub mod user;
