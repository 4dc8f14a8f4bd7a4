//! Server error types

use axum::response::{IntoResponse, Response};
use santa_api::ApiError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] santa_core::db::DatabaseError),

    #[error("Core error: {0}")]
    Core(#[from] santa_core::error::CoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    Argon2(#[from] argon2::password_hash::Error),

    #[error("Invalid address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    #[diagnostic(help("Check santa.toml and the SANTA_* environment variables"))]
    Config(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Convert to ApiError for consistent error responses
        let api_error = match self {
            ServerError::Database(e) => ApiError::from(e),
            ServerError::Core(e) => ApiError::from(e),
            ServerError::Api(e) => e,
            ServerError::Jwt(_) => ApiError::unauthorized("Invalid or expired token"),
            ServerError::Argon2(e) => ApiError::Core {
                message: format!("Password hashing failed: {}", e),
                json: String::new(),
            },
            ServerError::Config(_) => ApiError::ServiceUnavailable {
                retry_after_seconds: None,
            },
            _ => ApiError::ServiceUnavailable {
                retry_after_seconds: Some(30),
            },
        };

        api_error.into_response()
    }
}
