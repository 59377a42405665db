use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TrackerError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Argon2 hash in PHC form, or a werkzeug `pbkdf2:sha256` hash carried
    /// over from older accounts.
    pub password: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, username: Option<String>, password_hash: String) -> User {
        User {
            id: ObjectId::new(),
            email,
            username,
            password: password_hash,
            created_at: Utc::now(),
        }
    }
}

/// How a user identifies at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginId {
    Email(String),
    Username(String),
}

impl LoginId {
    pub fn parse(login_id: &str) -> LoginId {
        let login_id = login_id.trim();
        if login_id.contains('@') {
            LoginId::Email(normalize_email(login_id))
        } else {
            LoginId::Username(login_id.to_owned())
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<String, TrackerError> {
    let email = normalize_email(email);
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(TrackerError::invalid(format!("'{}' is not an email", email)))
    }
}

/// Blank usernames are stored as absent. `@` is reserved for emails.
pub fn validate_username(username: Option<&str>) -> Result<Option<String>, TrackerError> {
    match username.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) if name.contains('@') => Err(TrackerError::invalid(
            "username must not contain '@'",
        )),
        Some(name) => Ok(Some(name.to_owned())),
    }
}
