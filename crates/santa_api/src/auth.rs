//! Token claims and roles

use santa_core::id::UserId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Who a token speaks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Participant,
}

impl Role {
    pub fn for_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Self::Admin
        } else {
            Self::Participant
        }
    }

    /// Whether a caller holding `self` may use a route gated on `required`.
    /// Admins may call participant routes; the reverse is forbidden.
    pub fn permits(self, required: Role) -> bool {
        match required {
            Role::Participant => true,
            Role::Admin => self == Role::Admin,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Participant => "participant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User the token was issued to
    pub sub: UserId,
    /// Role at issue time
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Unique token id
    pub jti: uuid::Uuid,
    pub token_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permits() {
        assert!(Role::Admin.permits(Role::Admin));
        assert!(Role::Admin.permits(Role::Participant));
        assert!(Role::Participant.permits(Role::Participant));
        assert!(!Role::Participant.permits(Role::Admin));
    }

    #[test]
    fn test_claims_serialize_typed_subject() {
        let claims = AccessTokenClaims {
            sub: UserId::generate(),
            role: Role::for_admin_flag(true),
            iat: 0,
            exp: 60,
            jti: uuid::Uuid::new_v4(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json["sub"].as_str().unwrap().starts_with("user_"));
        assert_eq!(json["role"], "admin");
    }
}
