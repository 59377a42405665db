use bson::oid::ObjectId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Common error: {0}")]
    Eyre(#[from] eyre::Error),
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("User not found: {0}")]
    UserNotFound(ObjectId),
    #[error("Food item not found: {0}")]
    FoodItemNotFound(String),
}

impl TrackerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        TrackerError::InvalidInput(msg.into())
    }
}
