//! [`SantaStore`] backed by SurrealDB

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use super::{DatabaseConfig, DatabaseError, connect};
use crate::derangement::Pairing;
use crate::error::{CoreError, Result};
use crate::id::UserId;
use crate::reveal::{Assignment, MarkViewed};
use crate::store::SantaStore;
use crate::users::{NewUser, User};

const USER_FIELDS: &str = "uid, name, username, password_hash, is_admin, created_at, updated_at";
const ASSIGNMENT_FIELDS: &str = "giver, receiver, has_viewed";
const MARK_VIEWED_ATTEMPTS: usize = 8;

/// Storage shape of a user row
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbUser {
    uid: UserId,
    name: String,
    username: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<User> for DbUser {
    fn from(user: User) -> Self {
        Self {
            uid: user.id,
            name: user.name,
            username: user.username,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<DbUser> for User {
    fn from(row: DbUser) -> Self {
        Self {
            id: row.uid,
            name: row.name,
            username: row.username,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Storage shape of a new assignment row
#[derive(Debug, Clone, Serialize)]
struct NewAssignmentRow {
    giver: UserId,
    receiver: UserId,
    has_viewed: bool,
    assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
struct AssignmentRow {
    giver: UserId,
    receiver: UserId,
    has_viewed: bool,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Self {
            giver: row.giver,
            receiver: row.receiver,
            has_viewed: row.has_viewed,
        }
    }
}

fn query_failed(err: surrealdb::Error) -> CoreError {
    DatabaseError::QueryFailed(err).into()
}

/// Optimistic transaction conflicts are reported as query errors whose
/// message marks them as retryable.
fn is_write_conflict(err: &surrealdb::Error) -> bool {
    err.to_string().contains("can be retried")
}

/// A unique index rejected the write
fn is_index_violation(err: &surrealdb::Error, index: &str) -> bool {
    let message = err.to_string();
    message.contains("already contains") && message.contains(index)
}

fn transaction_failed(err: surrealdb::Error) -> CoreError {
    DatabaseError::TransactionFailed(err).into()
}

#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Any>,
}

impl SurrealStore {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Connect using `config` and run migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::new(connect(config).await?))
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }

    async fn select_users(&self, filter: &str) -> Result<Vec<User>> {
        let rows: Vec<DbUser> = self
            .db
            .query(format!(
                "SELECT {USER_FIELDS} FROM user {filter} ORDER BY username ASC"
            ))
            .await
            .map_err(query_failed)?
            .take(0)
            .map_err(query_failed)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn select_user(&self, filter: &str, param: (&'static str, String)) -> Result<Option<User>> {
        let rows: Vec<DbUser> = self
            .db
            .query(format!("SELECT {USER_FIELDS} FROM user {filter} LIMIT 1"))
            .bind(param)
            .await
            .map_err(query_failed)?
            .take(0)
            .map_err(query_failed)?;
        Ok(rows.into_iter().next().map(User::from))
    }

    /// Conditional update: `true` only for the call that flipped the flag
    async fn set_viewed(&self, giver: UserId) -> std::result::Result<bool, surrealdb::Error> {
        let updated: Vec<AssignmentRow> = self
            .db
            .query(format!(
                "UPDATE assignment SET has_viewed = true, viewed_at = $now \
                 WHERE giver = $giver AND has_viewed = false \
                 RETURN {ASSIGNMENT_FIELDS}"
            ))
            .bind(("now", Utc::now()))
            .bind(("giver", giver.to_string()))
            .await?
            .take(0)?;
        Ok(!updated.is_empty())
    }
}

#[async_trait]
impl SantaStore for SurrealStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = user.validate()?;
        if self.find_user_by_username(&user.username).await?.is_some() {
            return Err(CoreError::UsernameTaken {
                username: user.username,
            });
        }

        let user = user.into_user();
        tracing::debug!(user_id = %user.id, username = %user.username, "Creating user");
        let created = self
            .db
            .query("CREATE user CONTENT $user")
            .bind(("user", DbUser::from(user.clone())))
            .await
            .and_then(|response| response.check());

        if let Err(err) = created {
            // A concurrent create of the same handle got there first
            let taken = is_index_violation(&err, "user_username")
                || (is_write_conflict(&err)
                    && self.find_user_by_username(&user.username).await?.is_some());
            return Err(if taken {
                CoreError::UsernameTaken {
                    username: user.username,
                }
            } else {
                query_failed(err)
            });
        }

        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.select_user("WHERE uid = $uid", ("uid", id.to_string()))
            .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.select_user("WHERE username = $username", ("username", username.to_string()))
            .await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.select_users("").await
    }

    async fn list_eligible_users(&self) -> Result<Vec<User>> {
        self.select_users("WHERE is_admin = false").await
    }

    async fn count_admins(&self) -> Result<usize> {
        #[derive(Deserialize)]
        struct Count {
            count: usize,
        }

        let rows: Vec<Count> = self
            .db
            .query("SELECT count() AS count FROM user WHERE is_admin = true GROUP ALL")
            .await
            .map_err(query_failed)?
            .take(0)
            .map_err(query_failed)?;
        Ok(rows.first().map(|row| row.count).unwrap_or(0))
    }

    async fn update_password(&self, id: UserId, password_hash: String) -> Result<User> {
        if self.get_user(id).await?.is_none() {
            return Err(CoreError::user_not_found(id));
        }

        self.db
            .query(
                "UPDATE user SET password_hash = $hash, updated_at = $now \
                 WHERE uid = $uid RETURN NONE",
            )
            .bind(("hash", password_hash))
            .bind(("now", Utc::now()))
            .bind(("uid", id.to_string()))
            .await
            .and_then(|response| response.check())
            .map_err(query_failed)?;

        self.get_user(id)
            .await?
            .ok_or_else(|| CoreError::user_not_found(id))
    }

    async fn delete_user(&self, id: UserId) -> Result<User> {
        let user = self
            .get_user(id)
            .await?
            .ok_or_else(|| CoreError::user_not_found(id))?;

        self.db
            .query(
                "BEGIN TRANSACTION;
                 DELETE assignment WHERE giver = $uid OR receiver = $uid;
                 DELETE user WHERE uid = $uid;
                 COMMIT TRANSACTION;",
            )
            .bind(("uid", id.to_string()))
            .await
            .and_then(|response| response.check())
            .map_err(transaction_failed)?;

        tracing::debug!(user_id = %id, "Deleted user and their assignments");
        Ok(user)
    }

    async fn replace_assignments(&self, pairing: &Pairing<UserId>) -> Result<()> {
        let now = Utc::now();
        let rows: Vec<NewAssignmentRow> = pairing
            .iter()
            .map(|(giver, receiver)| NewAssignmentRow {
                giver: *giver,
                receiver: *receiver,
                has_viewed: false,
                assigned_at: now,
            })
            .collect();

        self.db
            .query(
                "BEGIN TRANSACTION;
                 DELETE assignment;
                 FOR $row IN $rows { CREATE assignment CONTENT $row; };
                 COMMIT TRANSACTION;",
            )
            .bind(("rows", rows))
            .await
            .and_then(|response| response.check())
            .map_err(transaction_failed)?;

        tracing::debug!(count = pairing.len(), "Replaced assignments");
        Ok(())
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>> {
        let rows: Vec<AssignmentRow> = self
            .db
            .query(format!(
                "SELECT {ASSIGNMENT_FIELDS} FROM assignment ORDER BY giver ASC"
            ))
            .await
            .map_err(query_failed)?
            .take(0)
            .map_err(query_failed)?;
        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    async fn assignment_for(&self, giver: UserId) -> Result<Option<Assignment>> {
        let rows: Vec<AssignmentRow> = self
            .db
            .query(format!(
                "SELECT {ASSIGNMENT_FIELDS} FROM assignment WHERE giver = $giver LIMIT 1"
            ))
            .bind(("giver", giver.to_string()))
            .await
            .map_err(query_failed)?
            .take(0)
            .map_err(query_failed)?;
        Ok(rows.into_iter().next().map(Assignment::from))
    }

    async fn mark_viewed(&self, giver: UserId) -> Result<MarkViewed> {
        for attempt in 1..=MARK_VIEWED_ATTEMPTS {
            match self.set_viewed(giver).await {
                Ok(true) => return Ok(MarkViewed::Marked),
                Ok(false) => break,
                // Another call committed first; the retry sees its write
                Err(err) if attempt < MARK_VIEWED_ATTEMPTS && is_write_conflict(&err) => {
                    tracing::debug!(giver = %giver, attempt, "Retrying mark_viewed after a write conflict");
                    tokio::task::yield_now().await;
                }
                Err(err) => return Err(query_failed(err)),
            }
        }

        match self.assignment_for(giver).await? {
            Some(row) => Ok(row.reveal_state().mark_viewed(&giver)?.1),
            None => Err(CoreError::no_assignment(giver)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;
    use std::sync::Arc;

    async fn store() -> SurrealStore {
        SurrealStore::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        conformance::create_and_lookup(&store().await).await;
    }

    #[tokio::test]
    async fn test_eligible_users_exclude_admins() {
        conformance::eligible_users_exclude_admins(&store().await).await;
    }

    #[tokio::test]
    async fn test_replace_resets_viewed() {
        conformance::replace_resets_viewed(&store().await).await;
    }

    #[tokio::test]
    async fn test_mark_viewed_is_conditional() {
        conformance::mark_viewed_is_conditional(&store().await).await;
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        conformance::delete_cascades(&store().await).await;
    }

    #[tokio::test]
    async fn test_update_password() {
        conformance::update_password(&store().await).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mark_viewed() {
        conformance::concurrent_mark_viewed(Arc::new(store().await)).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_usernames() {
        conformance::concurrent_duplicate_usernames(Arc::new(store().await)).await;
    }

    #[tokio::test]
    async fn test_count_admins_empty() {
        assert_eq!(store().await.count_admins().await.unwrap(), 0);
    }
}
