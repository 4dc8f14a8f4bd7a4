//! API request types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Login with username/password
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// Trimmed username and password, or `None` if either is blank
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((username, self.password.as_str()))
        }
    }
}

/// Batch user creation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateUsersRequest {
    #[serde(default)]
    pub users: Vec<CreateUserEntry>,
}

/// One entry of a batch. Fields are optional so that a malformed entry is
/// reported on its own instead of rejecting the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateUserEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// A complete batch entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUserEntry {
    pub name: String,
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

impl CreateUserEntry {
    /// Check that every required field is present and non-blank.
    pub fn validate(&self) -> Result<ValidUserEntry, String> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        match (
            present(&self.name),
            present(&self.username),
            self.password.clone().filter(|p| !p.is_empty()),
        ) {
            (Some(name), Some(username), Some(password)) => Ok(ValidUserEntry {
                name,
                username,
                password,
                is_admin: self.is_admin,
            }),
            _ => Err(format!(
                "Missing required fields for user: {}",
                self.label()
            )),
        }
    }

    fn label(&self) -> &str {
        self.username
            .as_deref()
            .or(self.name.as_deref())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or("<unnamed>")
    }
}

/// Admin password reset
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub new_password: String,
}
