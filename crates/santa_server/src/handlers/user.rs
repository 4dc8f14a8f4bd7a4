//! Participant handlers

use axum::extract::{Extension, Json, State};
use santa_api::{
    AccessTokenClaims,
    responses::{AssignmentResponse, MarkViewedResponse, PublicUserResponse},
};

use crate::{error::ServerResult, state::AppState};

/// The caller's receiver. Reading never marks the assignment as viewed.
pub async fn get_assignment(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> ServerResult<Json<AssignmentResponse>> {
    let reveal = state.exchange.get_assignment(claims.sub).await?;
    Ok(Json(reveal.into()))
}

pub async fn mark_viewed(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessTokenClaims>,
) -> ServerResult<Json<MarkViewedResponse>> {
    let outcome = state.exchange.mark_viewed(claims.sub).await?;
    Ok(Json(MarkViewedResponse {
        has_viewed: true,
        changed: outcome.changed(),
    }))
}

/// Names of every user, for the reveal animation
pub async fn list_users(
    State(state): State<AppState>,
) -> ServerResult<Json<Vec<PublicUserResponse>>> {
    let users = state.exchange.store().list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}
