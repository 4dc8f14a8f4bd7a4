//! Authentication handlers

use axum::extract::{Extension, Json, State};
use santa_api::{
    AccessTokenClaims, ApiError, Role,
    requests::LoginRequest,
    responses::{AuthResponse, UserResponse},
};
use santa_core::CoreError;

use crate::{
    auth::{generate_access_token, verify_password},
    error::ServerResult,
    extract::ApiJson,
    state::AppState,
};

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Handle login requests
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ServerResult<Json<AuthResponse>> {
    let (username, password) = request
        .credentials()
        .ok_or_else(|| ApiError::validation("Username and password are required"))?;

    let Some(user) = state
        .exchange
        .store()
        .find_user_by_username(username)
        .await?
    else {
        tracing::warn!(username, "Login for unknown user");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS).into());
    };

    if !verify_password(password, &user.password_hash)? {
        tracing::warn!(username, "Login with wrong password");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS).into());
    }

    let access_token = generate_access_token(
        user.id,
        Role::for_admin_flag(user.is_admin),
        &state.jwt_encoding_key,
        state.config.access_token_ttl,
    )?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.access_token_ttl,
        user: UserResponse::from(user),
    }))
}

/// The authenticated caller's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> ServerResult<Json<UserResponse>> {
    let user = state
        .exchange
        .store()
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| CoreError::user_not_found(claims.sub))?;

    Ok(Json(UserResponse::from(user)))
}
