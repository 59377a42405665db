use std::sync::Arc;

use eyre::{Error, Result};
use log::{info, warn};
use model::{
    errors::TrackerError,
    session::Session,
    user::{validate_email, validate_username, LoginId, User},
};
use mongodb::bson::oid::ObjectId;
use storage::{
    calories::CalorieStore, food_items::FoodItemStore, legacy::LegacyStore, tips::TipStore,
    users::UserStore,
};
use thiserror::Error;
use tx_macro::tx;

use super::password::{hash_password, needs_rehash, verify_password};

#[derive(Clone)]
pub struct Users {
    store: Arc<UserStore>,
    tips: Arc<TipStore>,
    calories: Arc<CalorieStore>,
    food_items: Arc<FoodItemStore>,
    legacy: Arc<LegacyStore>,
}

/// What an import moved out of the legacy collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyImport {
    pub days: usize,
    pub items: usize,
}

impl Users {
    pub(crate) fn new(
        store: Arc<UserStore>,
        tips: Arc<TipStore>,
        calories: Arc<CalorieStore>,
        food_items: Arc<FoodItemStore>,
        legacy: Arc<LegacyStore>,
    ) -> Self {
        Users {
            store,
            tips,
            calories,
            food_items,
            legacy,
        }
    }

    pub async fn sign_up(
        &self,
        session: &mut Session,
        email: &str,
        username: Option<&str>,
        password: &str,
    ) -> Result<ObjectId, SignUpError> {
        let email = validate_email(email)?;
        let username = validate_username(username)?;
        if password.is_empty() {
            return Err(TrackerError::invalid("password must not be empty").into());
        }

        if self.store.find_by_email(session, &email).await?.is_some() {
            return Err(SignUpError::AlreadyExists);
        }
        if let Some(username) = &username {
            if self.store.find_by_username(session, username).await?.is_some() {
                return Err(SignUpError::AlreadyExists);
            }
        }

        let user = User::new(email, username, hash_password(password)?);
        if !self.store.insert(session, &user).await? {
            return Err(SignUpError::AlreadyExists);
        }
        Ok(user.id)
    }

    /// `None` on an unknown login or a wrong password. A matching legacy
    /// hash is replaced by an Argon2 one.
    pub async fn login(
        &self,
        session: &mut Session,
        login_id: &str,
        password: &str,
    ) -> Result<Option<User>> {
        let user = match LoginId::parse(login_id) {
            LoginId::Email(email) => self.store.find_by_email(session, &email).await?,
            LoginId::Username(username) => self.store.find_by_username(session, &username).await?,
        };
        let mut user = match user {
            Some(user) => user,
            None => return Ok(None),
        };
        if verify_password(password, &user.password) {
            if needs_rehash(&user.password) {
                user.password = hash_password(password)?;
                self.store.set_password(session, user.id, &user.password).await?;
            }
            Ok(Some(user))
        } else {
            warn!("Failed login for {}", user.id);
            Ok(None)
        }
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<User>> {
        self.store.get(session, id).await
    }

    pub async fn count(&self, session: &mut Session) -> Result<u64> {
        self.store.count(session).await
    }

    /// Removes the user with all of their records. `false` when the user
    /// does not exist.
    #[tx]
    pub async fn delete(
        &self,
        session: &mut Session,
        id: ObjectId,
        password: &str,
    ) -> Result<bool, DeleteUserError> {
        let user = match self.store.get(session, id).await? {
            Some(user) => user,
            None => return Ok(false),
        };
        if !verify_password(password, &user.password) {
            return Err(DeleteUserError::WrongPassword);
        }

        let tips = self.tips.delete_by_user(session, id).await?;
        let days = self.calories.delete_by_user(session, id).await?;
        let items = self.food_items.delete_by_user(session, id).await?;
        self.store.delete(session, id).await?;
        info!(
            "Deleted user {} with {} tips, {} calorie days and {} food items",
            id, tips, days, items
        );
        Ok(true)
    }

    /// Moves data of the per-user collections into the shared ones and
    /// drops the old collections afterwards.
    pub async fn import_legacy(&self, session: &mut Session, id: ObjectId) -> Result<LegacyImport> {
        if self.store.get(session, id).await?.is_none() {
            return Err(TrackerError::UserNotFound(id).into());
        }
        if !self.legacy.exists(session, id).await? {
            return Ok(LegacyImport::default());
        }
        let imported = self.copy_legacy(session, id).await?;
        self.legacy.drop_collections(session, id).await?;
        info!(
            "Imported {} calorie days and {} food items of user {}",
            imported.days, imported.items, id
        );
        Ok(imported)
    }

    #[tx]
    async fn copy_legacy(&self, session: &mut Session, id: ObjectId) -> Result<LegacyImport> {
        let days = self.legacy.days(session, id).await?;
        let items = self.legacy.items(session, id).await?;

        let mut imported = LegacyImport::default();
        for day in days {
            if day.total_calories.is_positive() {
                self.calories
                    .add(session, id, day.date, day.total_calories)
                    .await?;
                imported.days += 1;
            }
        }
        for item in items {
            if item.calories.is_negative() {
                continue;
            }
            self.food_items
                .upsert(session, id, &item.name, item.calories)
                .await?;
            imported.items += 1;
        }
        Ok(imported)
    }
}

#[derive(Error, Debug)]
pub enum SignUpError {
    #[error("A user with this email or username already exists")]
    AlreadyExists,
    #[error(transparent)]
    Invalid(#[from] TrackerError),
    #[error(transparent)]
    Other(#[from] Error),
}

#[derive(Error, Debug)]
pub enum DeleteUserError {
    #[error("Wrong password")]
    WrongPassword,
    #[error(transparent)]
    Other(#[from] Error),
}
