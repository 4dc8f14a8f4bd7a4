use crate::db::DatabaseError;
use miette::Diagnostic;
use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Not enough participants to generate assignments: need at least 2, found {found}")]
    #[diagnostic(
        code(santa_core::insufficient_participants),
        help("Create at least two non-admin users before generating assignments")
    )]
    InsufficientParticipants { found: usize },

    #[error("No assignment available for {user_id}")]
    #[diagnostic(
        code(santa_core::no_assignment),
        help(
            "Assignments have not been generated yet, or this pairing was invalidated by a user deletion"
        )
    )]
    NoAssignment { user_id: String },

    #[error("Assignment generation did not converge after {attempts} attempts")]
    #[diagnostic(
        code(santa_core::generation_retry_exhausted),
        help("Both rejection sampling and the cyclic fallback failed; no pairing was stored")
    )]
    GenerationRetryExhausted { attempts: usize },

    #[error("User not found: {user_id}")]
    #[diagnostic(
        code(santa_core::user_not_found),
        help("Check that the user ID is correct and the user has not been deleted")
    )]
    UserNotFound { user_id: String },

    #[error("Username already exists: {username}")]
    #[diagnostic(
        code(santa_core::username_taken),
        help("Usernames are unique; pick a different one")
    )]
    UsernameTaken { username: String },

    #[error("Cannot delete the last admin user: {username}")]
    #[diagnostic(
        code(santa_core::last_administrator),
        help("Create another admin account before deleting this one")
    )]
    LastAdministrator { username: String },

    #[error("Invalid user: {field} {reason}")]
    #[diagnostic(code(santa_core::invalid_user))]
    InvalidUser { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn no_assignment(user_id: impl Display) -> Self {
        Self::NoAssignment {
            user_id: user_id.to_string(),
        }
    }

    pub fn user_not_found(user_id: impl Display) -> Self {
        Self::UserNotFound {
            user_id: user_id.to_string(),
        }
    }

    pub fn invalid_user(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUser {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Errors a caller is expected to handle and show to the user, as opposed
    /// to internal failures.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::GenerationRetryExhausted { .. } | Self::Database(_)
        )
    }
}
