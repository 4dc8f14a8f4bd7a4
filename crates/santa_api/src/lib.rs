//! Santa API types and definitions
//!
//! This crate defines the request/response types for the Santa exchange
//! API, shared between the server and its clients.

pub mod auth;
pub mod error;
pub mod requests;
pub mod responses;

pub use auth::{AccessTokenClaims, Role};
pub use error::ApiError;

// Re-export common types from santa-core
pub use santa_core::id::UserId;

/// API version constant
pub const API_VERSION: &str = "v1";

/// Route paths, relative to the `/api/v1` prefix
pub mod paths {
    pub const PREFIX: &str = "/api/v1";

    pub const HEALTH: &str = "/health";

    pub const LOGIN: &str = "/auth/login";
    pub const ME: &str = "/auth/me";

    pub const ADMIN_USERS: &str = "/admin/users";
    pub const ADMIN_USER: &str = "/admin/users/:id";
    pub const ADMIN_USER_PASSWORD: &str = "/admin/users/:id/password";
    pub const ADMIN_ASSIGNMENTS: &str = "/admin/assignments";

    pub const USER_ASSIGNMENT: &str = "/user/assignment";
    pub const USER_ASSIGNMENT_VIEWED: &str = "/user/assignment/viewed";
    pub const USER_USERS: &str = "/user/users";
}
