//! The exchange service: generation runs, reveals and admin mutations on top
//! of a [`SantaStore`].
//!
//! Generation and user deletion share one async mutex. Without it a deletion
//! could land between listing the eligible users and persisting the pairing,
//! leaving a pairing that references a user who no longer exists.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::db::DatabaseError;
use crate::derangement::{DerangementGenerator, Pairing};
use crate::error::{CoreError, Result};
use crate::id::UserId;
use crate::reveal::{MarkViewed, RevealState};
use crate::store::SantaStore;
use crate::users::{NewUser, User, UserStatus};

/// Result of a generation run
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Number of participants paired
    pub count: usize,
}

/// A participant's revealed assignment
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Reveal {
    pub receiver_id: UserId,
    pub receiver_name: String,
    pub has_viewed: bool,
}

/// One row of the admin pairing overview
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AssignmentEntry {
    pub giver_id: UserId,
    pub giver_name: String,
    pub receiver_id: UserId,
    pub receiver_name: String,
    pub has_viewed: bool,
}

pub struct Exchange {
    store: Arc<dyn SantaStore>,
    generator: DerangementGenerator,
    admin_ops: Mutex<()>,
}

impl Exchange {
    pub fn new(store: Arc<dyn SantaStore>, generator: DerangementGenerator) -> Self {
        Self {
            store,
            generator,
            admin_ops: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn SantaStore> {
        &self.store
    }

    /// Pair every eligible user and replace all existing assignments.
    pub async fn generate_assignments(&self) -> Result<GenerationSummary> {
        let _guard = self.admin_ops.lock().await;

        let participants: Vec<UserId> = self
            .store
            .list_eligible_users()
            .await?
            .into_iter()
            .map(|user| user.id)
            .collect();

        let pairing: Pairing<UserId> = self.generator.generate(&participants)?;
        self.store.replace_assignments(&pairing).await?;

        info!(participants = pairing.len(), "Generated assignments");
        Ok(GenerationSummary {
            count: pairing.len(),
        })
    }

    /// Read-only reveal query for `user_id`.
    pub async fn get_assignment(&self, user_id: UserId) -> Result<Reveal> {
        self.require_user(user_id).await?;

        let state = self.reveal_state(user_id).await?;
        let view = state.view(&user_id)?;
        let receiver = self.store.get_user(view.receiver).await?.ok_or_else(|| {
            DatabaseError::CorruptRecord {
                table: "assignment".to_string(),
                reason: format!("receiver {} of {} does not exist", view.receiver, user_id),
            }
        })?;

        Ok(Reveal {
            receiver_id: receiver.id,
            receiver_name: receiver.name,
            has_viewed: view.has_viewed,
        })
    }

    /// One-way `Assigned → Viewed` transition; repeating it is a no-op.
    pub async fn mark_viewed(&self, user_id: UserId) -> Result<MarkViewed> {
        self.require_user(user_id).await?;

        let outcome = self.store.mark_viewed(user_id).await?;
        if outcome.changed() {
            info!(user_id = %user_id, "Assignment revealed");
        }
        Ok(outcome)
    }

    pub async fn reveal_state(&self, user_id: UserId) -> Result<RevealState<UserId>> {
        Ok(self
            .store
            .assignment_for(user_id)
            .await?
            .map(|row| row.reveal_state())
            .unwrap_or_default())
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = self.store.create_user(user).await?;
        info!(user_id = %user.id, username = %user.username, is_admin = user.is_admin, "Created user");
        Ok(user)
    }

    pub async fn change_password(&self, user_id: UserId, password_hash: String) -> Result<User> {
        let user = self.store.update_password(user_id, password_hash).await?;
        info!(user_id = %user_id, "Password changed");
        Ok(user)
    }

    /// Delete a user and every pairing they take part in. The last admin
    /// cannot be removed.
    pub async fn delete_user(&self, user_id: UserId) -> Result<User> {
        let _guard = self.admin_ops.lock().await;

        let user = self.require_user(user_id).await?;
        if user.is_admin && self.store.count_admins().await? <= 1 {
            return Err(CoreError::LastAdministrator {
                username: user.username,
            });
        }

        let deleted = self.store.delete_user(user_id).await?;
        info!(user_id = %user_id, username = %deleted.username, "Deleted user");
        Ok(deleted)
    }

    /// Every user with their reveal state, ordered by username.
    pub async fn user_statuses(&self) -> Result<Vec<UserStatus>> {
        let users = self.store.list_users().await?;
        let mut states: HashMap<UserId, RevealState<UserId>> = self
            .store
            .list_assignments()
            .await?
            .into_iter()
            .map(|row| (row.giver, row.reveal_state()))
            .collect();

        Ok(users
            .into_iter()
            .map(|user| {
                let reveal = states.remove(&user.id).unwrap_or_default();
                UserStatus { user, reveal }
            })
            .collect())
    }

    /// Every pairing with display names, ordered by giver name.
    pub async fn assignment_entries(&self) -> Result<Vec<AssignmentEntry>> {
        let names: HashMap<UserId, String> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect();

        let mut entries: Vec<AssignmentEntry> = self
            .store
            .list_assignments()
            .await?
            .into_iter()
            .filter_map(|row| {
                Some(AssignmentEntry {
                    giver_name: names.get(&row.giver)?.clone(),
                    receiver_name: names.get(&row.receiver)?.clone(),
                    giver_id: row.giver,
                    receiver_id: row.receiver,
                    has_viewed: row.has_viewed,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.giver_name.cmp(&b.giver_name));
        Ok(entries)
    }

    async fn require_user(&self, user_id: UserId) -> Result<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::user_not_found(user_id))
    }
}
