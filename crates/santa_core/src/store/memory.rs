//! In-process store
//!
//! Every operation takes the one lock for its whole duration, which makes the
//! multi-row operations atomic for free.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::SantaStore;
use crate::derangement::Pairing;
use crate::error::{CoreError, Result};
use crate::id::UserId;
use crate::reveal::{Assignment, MarkViewed};
use crate::users::{NewUser, User};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    assignments: BTreeMap<UserId, Assignment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_username(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| a.username.cmp(&b.username));
    users
}

#[async_trait]
impl SantaStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = user.validate()?;
        let mut inner = self.inner.write();
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(CoreError::UsernameTaken {
                username: user.username,
            });
        }

        let user = user.into_user();
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.inner.read().users.values().cloned().collect();
        Ok(sorted_by_username(users))
    }

    async fn list_eligible_users(&self) -> Result<Vec<User>> {
        let users = self
            .inner
            .read()
            .users
            .values()
            .filter(|u| u.is_eligible())
            .cloned()
            .collect();
        Ok(sorted_by_username(users))
    }

    async fn count_admins(&self) -> Result<usize> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .filter(|u| u.is_admin)
            .count())
    }

    async fn update_password(&self, id: UserId, password_hash: String) -> Result<User> {
        let mut inner = self.inner.write();
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| CoreError::user_not_found(id))?;
        user.password_hash = password_hash;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<User> {
        let mut inner = self.inner.write();
        let user = inner
            .users
            .remove(&id)
            .ok_or_else(|| CoreError::user_not_found(id))?;
        inner
            .assignments
            .retain(|giver, row| *giver != id && row.receiver != id);
        Ok(user)
    }

    async fn replace_assignments(&self, pairing: &Pairing<UserId>) -> Result<()> {
        let mut inner = self.inner.write();
        inner.assignments = pairing
            .iter()
            .map(|(giver, receiver)| {
                (
                    *giver,
                    Assignment {
                        giver: *giver,
                        receiver: *receiver,
                        has_viewed: false,
                    },
                )
            })
            .collect();
        Ok(())
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>> {
        Ok(self.inner.read().assignments.values().cloned().collect())
    }

    async fn assignment_for(&self, giver: UserId) -> Result<Option<Assignment>> {
        Ok(self.inner.read().assignments.get(&giver).cloned())
    }

    async fn mark_viewed(&self, giver: UserId) -> Result<MarkViewed> {
        let mut inner = self.inner.write();
        let row = inner
            .assignments
            .get_mut(&giver)
            .ok_or_else(|| CoreError::no_assignment(giver))?;

        let (state, outcome) = row.reveal_state().mark_viewed(&giver)?;
        row.has_viewed = state.has_viewed();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_and_lookup() {
        conformance::create_and_lookup(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_eligible_users_exclude_admins() {
        conformance::eligible_users_exclude_admins(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_replace_resets_viewed() {
        conformance::replace_resets_viewed(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_mark_viewed_is_conditional() {
        conformance::mark_viewed_is_conditional(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        conformance::delete_cascades(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_update_password() {
        conformance::update_password(&MemoryStore::new()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mark_viewed() {
        conformance::concurrent_mark_viewed(Arc::new(MemoryStore::new())).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_usernames() {
        conformance::concurrent_duplicate_usernames(Arc::new(MemoryStore::new())).await;
    }
}
