use std::ops::Deref;

use bson::doc;
use eyre::{Context as _, Error};
use model::session::Session;
use mongodb::{Client, Database};

#[derive(Clone)]
pub struct Db {
    client: Client,
    db: Database,
}

impl Db {
    pub(crate) async fn new(uri: &str, db_name: &str) -> Result<Self, Error> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Failed to connect to MongoDB")?;
        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .context("Failed to ping MongoDB")?;
        Ok(Db { client, db })
    }

    pub async fn start_session(&self) -> Result<Session, Error> {
        let session = self
            .client
            .start_session()
            .await
            .context("Failed to start session")?;
        Ok(Session::new(session))
    }

    pub async fn drop_database(&self) -> Result<(), Error> {
        self.db.drop().await?;
        Ok(())
    }
}

impl Deref for Db {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Opens a throwaway connection to check that `uri` and `db_name` work.
/// Returns the failure as text for display.
pub async fn test_connection(uri: &str, db_name: &str) -> Result<(), String> {
    let client = Client::with_uri_str(uri)
        .await
        .map_err(|err| err.to_string())?;
    client
        .database(db_name)
        .list_collection_names()
        .await
        .map_err(|err| err.to_string())?;
    Ok(())
}
