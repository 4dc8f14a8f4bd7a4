use crate::error::{CoreError, Result};
use crate::id::UserId;
use crate::reveal::RevealState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for this user
    pub id: UserId,

    /// Display name shown to other participants
    pub name: String,

    /// Unique login handle
    pub username: String,

    /// Argon2 PHC string; never leaves the server
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Admins run the exchange and are excluded from the pool
    pub is_admin: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_eligible(&self) -> bool {
        !self.is_admin
    }
}

/// Data needed to create a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl NewUser {
    /// Trim the name and username and reject blank fields.
    pub fn validate(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let username = self.username.trim().to_string();

        if name.is_empty() {
            return Err(CoreError::invalid_user("name", "must not be blank"));
        }
        if username.is_empty() {
            return Err(CoreError::invalid_user("username", "must not be blank"));
        }
        if self.password_hash.is_empty() {
            return Err(CoreError::invalid_user("password", "must not be blank"));
        }

        Ok(Self {
            name,
            username,
            ..self
        })
    }

    /// Materialise the record with a fresh id and timestamps.
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: UserId::generate(),
            name: self.name,
            username: self.username,
            password_hash: self.password_hash,
            is_admin: self.is_admin,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user together with their current reveal state, as shown to admins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatus {
    pub user: User,
    pub reveal: RevealState<UserId>,
}
