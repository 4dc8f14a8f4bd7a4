//! API response types

use santa_core::exchange::{AssignmentEntry, Reveal};
use santa_core::id::UserId;
use santa_core::users::{User, UserStatus};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Authentication response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Access token for API requests
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Expiration time in seconds
    pub expires_in: u64,
    /// User information
    pub user: UserResponse,
}

/// User response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub is_admin: bool,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role: Role::for_admin_flag(user.is_admin),
            name: user.name,
            username: user.username,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Admin view of a user with their reveal flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatusResponse {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub is_admin: bool,
    pub has_assignment: bool,
    pub has_viewed: bool,
}

impl From<UserStatus> for UserStatusResponse {
    fn from(status: UserStatus) -> Self {
        Self {
            has_assignment: status.reveal.has_assignment(),
            has_viewed: status.reveal.has_viewed(),
            id: status.user.id,
            name: status.user.name,
            username: status.user.username,
            is_admin: status.user.is_admin,
        }
    }
}

/// Non-sensitive listing entry visible to every participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUserResponse {
    pub id: UserId,
    pub name: String,
}

impl From<User> for PublicUserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
        }
    }
}

/// Outcome of a batch user creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUsersResponse {
    /// Usernames that were created
    pub created: Vec<String>,
    /// One message per rejected entry
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: String,
    pub count: usize,
}

/// A participant's own assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub receiver_id: UserId,
    /// Receiver's display name
    pub assigned_to: String,
    pub has_viewed: bool,
}

impl From<Reveal> for AssignmentResponse {
    fn from(reveal: Reveal) -> Self {
        Self {
            receiver_id: reveal.receiver_id,
            assigned_to: reveal.receiver_name,
            has_viewed: reveal.has_viewed,
        }
    }
}

/// One pairing in the admin overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentListEntry {
    pub giver_id: UserId,
    pub giver: String,
    pub receiver_id: UserId,
    pub receiver: String,
    pub has_viewed: bool,
}

impl From<AssignmentEntry> for AssignmentListEntry {
    fn from(entry: AssignmentEntry) -> Self {
        Self {
            giver_id: entry.giver_id,
            giver: entry.giver_name,
            receiver_id: entry.receiver_id,
            receiver: entry.receiver_name,
            has_viewed: entry.has_viewed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkViewedResponse {
    /// Always true after the call
    pub has_viewed: bool,
    /// Whether this call performed the transition
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub database_status: ComponentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Ok,
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use santa_core::reveal::RevealState;
    use santa_core::users::NewUser;

    fn user(is_admin: bool) -> User {
        NewUser {
            name: "Alice".to_string(),
            username: "alice".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            is_admin,
        }
        .into_user()
    }

    #[test]
    fn test_user_response_hides_hash() {
        let json = serde_json::to_value(UserResponse::from(user(true))).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "admin");
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_status_flags() {
        let receiver = UserId::generate();
        let status = UserStatusResponse::from(UserStatus {
            user: user(false),
            reveal: RevealState::Viewed(receiver),
        });
        assert!(status.has_assignment);
        assert!(status.has_viewed);
    }
}
