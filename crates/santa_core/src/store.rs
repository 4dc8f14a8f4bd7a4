//! Persistence boundary for users and pairings
//!
//! Two backends implement [`SantaStore`]: [`MemoryStore`] keeps everything
//! behind a single lock, and [`crate::db::SurrealStore`] persists to
//! SurrealDB. Both must make `replace_assignments` and `delete_user`
//! all-or-nothing and `mark_viewed` a conditional update.

use async_trait::async_trait;

use crate::derangement::Pairing;
use crate::error::Result;
use crate::id::UserId;
use crate::reveal::{Assignment, MarkViewed};
use crate::users::{NewUser, User};

pub mod memory;

pub use memory::MemoryStore;

#[async_trait]
pub trait SantaStore: Send + Sync {
    /// Insert a validated user; fails with `UsernameTaken` on a duplicate handle
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// All users ordered by username
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Non-admin users ordered by username
    async fn list_eligible_users(&self) -> Result<Vec<User>>;

    async fn count_admins(&self) -> Result<usize>;

    async fn update_password(&self, id: UserId, password_hash: String) -> Result<User>;

    /// Remove the user and every assignment they give or receive
    async fn delete_user(&self, id: UserId) -> Result<User>;

    /// Replace every stored assignment with `pairing`, all viewed flags unset
    async fn replace_assignments(&self, pairing: &Pairing<UserId>) -> Result<()>;

    /// All assignments ordered by giver
    async fn list_assignments(&self) -> Result<Vec<Assignment>>;

    async fn assignment_for(&self, giver: UserId) -> Result<Option<Assignment>>;

    /// Set the viewed flag only if it is currently unset
    async fn mark_viewed(&self, giver: UserId) -> Result<MarkViewed>;
}
