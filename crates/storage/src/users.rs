use bson::oid::ObjectId;
use eyre::Result;
use log::info;
use model::{session::Session, user::User};
use mongodb::{bson::doc, options::IndexOptions, Collection, Database, IndexModel};

use crate::filter::is_duplicate_key;

const COLLECTION: &str = "users";

pub struct UserStore {
    pub(crate) users: Collection<User>,
}

impl UserStore {
    pub(crate) async fn new(db: &Database) -> Result<Self> {
        let users = db.collection(COLLECTION);
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(IndexOptions::builder().unique(true).sparse(true).build())
                    .build(),
            )
            .await?;
        Ok(UserStore { users })
    }

    /// `false` when the email or username is already taken.
    pub async fn insert(&self, session: &mut Session, user: &User) -> Result<bool> {
        info!("Inserting user: {} ({})", user.email, user.id);
        match self.users.insert_one(user).session(&mut *session).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn find_by_email(&self, session: &mut Session, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one(doc! { "email": email })
            .session(&mut *session)
            .await?)
    }

    pub async fn find_by_username(
        &self,
        session: &mut Session,
        username: &str,
    ) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one(doc! { "username": username })
            .session(&mut *session)
            .await?)
    }

    pub async fn set_password(&self, session: &mut Session, id: ObjectId, hash: &str) -> Result<()> {
        info!("Updating password hash of user {}", id);
        self.users
            .update_one(doc! { "_id": id }, doc! { "$set": { "password": hash } })
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn count(&self, session: &mut Session) -> Result<u64> {
        Ok(self
            .users
            .count_documents(doc! {})
            .session(&mut *session)
            .await?)
    }

    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<u64> {
        info!("Deleting user: {}", id);
        let result = self
            .users
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count)
    }
}
