//! HTTP request handlers

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use santa_api::paths;

pub mod admin;
pub mod auth;
pub mod health;
pub mod user;

use crate::middleware::{require_admin, require_auth};
use crate::state::AppState;

/// Build all API routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route(paths::HEALTH, get(health::health_check))
        .route(paths::LOGIN, post(auth::login));

    let admin = Router::new()
        .route(
            paths::ADMIN_USERS,
            post(admin::create_users).get(admin::list_users),
        )
        .route(paths::ADMIN_USER, delete(admin::delete_user))
        .route(paths::ADMIN_USER_PASSWORD, put(admin::change_password))
        .route(
            paths::ADMIN_ASSIGNMENTS,
            post(admin::generate_assignments).get(admin::list_assignments),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let participant = Router::new()
        .route(paths::ME, get(auth::me))
        .route(paths::USER_ASSIGNMENT, get(user::get_assignment))
        .route(paths::USER_ASSIGNMENT_VIEWED, post(user::mark_viewed))
        .route(paths::USER_USERS, get(user::list_users))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    public.merge(admin).merge(participant)
}
