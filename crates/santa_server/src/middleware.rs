//! Authentication and role gating

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use santa_api::{ApiError, Role};

use crate::state::AppState;

type BearerHeader = TypedHeader<Authorization<Bearer>>;

/// Any authenticated caller
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<BearerHeader>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, bearer, Role::Participant, request, next).await
}

/// Admin callers only
pub async fn require_admin(
    State(state): State<AppState>,
    bearer: Option<BearerHeader>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, bearer, Role::Admin, request, next).await
}

/// Validate the bearer token, check its role against `required` and make
/// the claims available to handlers as an extension.
async fn authorize(
    state: &AppState,
    bearer: Option<BearerHeader>,
    required: Role,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

    let claims = crate::auth::validate_access_token(bearer.token(), &state.jwt_decoding_key)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    if !claims.role.permits(required) {
        tracing::warn!(user_id = %claims.sub, role = %claims.role, "Rejected call to {}", request.uri().path());
        return Err(ApiError::Forbidden {
            required_role: required.to_string(),
        });
    }

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
