//! Authentication utilities

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use santa_api::auth::ACCESS_TOKEN_TYPE;
use santa_api::{AccessTokenClaims, ApiError, Role};
use santa_core::id::UserId;

use crate::error::ServerResult;

/// Hash a plaintext password
pub fn hash_password(password: &str) -> ServerResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> ServerResult<bool> {
    let parsed_hash = PasswordHash::new(hash)?;
    let argon2 = Argon2::default();

    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate an access token
pub fn generate_access_token(
    user_id: UserId,
    role: Role,
    encoding_key: &EncodingKey,
    ttl_seconds: u64,
) -> ServerResult<String> {
    let now = chrono::Utc::now().timestamp();

    let claims = AccessTokenClaims {
        sub: user_id,
        role,
        iat: now,
        exp: now + ttl_seconds as i64,
        jti: uuid::Uuid::new_v4(),
        token_type: ACCESS_TOKEN_TYPE.to_string(),
    };

    Ok(encode(&Header::default(), &claims, encoding_key)?)
}

/// Validate an access token
pub fn validate_access_token(
    token: &str,
    decoding_key: &DecodingKey,
) -> ServerResult<AccessTokenClaims> {
    let token_data = decode::<AccessTokenClaims>(token, decoding_key, &Validation::default())?;
    if token_data.claims.token_type != ACCESS_TOKEN_TYPE {
        return Err(ApiError::unauthorized("Not an access token").into());
    }
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("hunter2", "not-a-phc-string"),
            Err(ServerError::Argon2(_))
        ));
    }

    #[test]
    fn test_token_round_trip() {
        let secret = b"test-secret";
        let user_id = UserId::generate();
        let token = generate_access_token(
            user_id,
            Role::Participant,
            &EncodingKey::from_secret(secret),
            60,
        )
        .unwrap();

        let claims = validate_access_token(&token, &DecodingKey::from_secret(secret)).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Participant);

        assert!(validate_access_token(&token, &DecodingKey::from_secret(b"other")).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let secret = b"test-secret";
        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: UserId::generate(),
            role: Role::Admin,
            iat: now - 7200,
            exp: now - 3600,
            jti: uuid::Uuid::new_v4(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap();

        assert!(matches!(
            validate_access_token(&token, &DecodingKey::from_secret(secret)),
            Err(ServerError::Jwt(_))
        ));
    }
}
