//! API error types

use miette::{Diagnostic, JSONReportHandler};
use santa_core::error::CoreError;
use santa_core::id::IdError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API error response
#[derive(Debug, thiserror::Error, Diagnostic, Serialize, Deserialize)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation failed: {message}")]
    #[diagnostic(
        code(api::validation_error),
        help("Check the field errors for specific validation issues")
    )]
    ValidationError {
        message: String,
        fields: Option<Vec<FieldError>>,
    },

    /// Authentication required
    #[error("Authentication required")]
    #[diagnostic(
        code(api::unauthorized),
        help("Please provide valid authentication credentials")
    )]
    Unauthorized { message: Option<String> },

    /// Insufficient permissions
    #[error("Insufficient permissions")]
    #[diagnostic(
        code(api::forbidden),
        help("You need the '{required_role}' role to perform this action")
    )]
    Forbidden { required_role: String },

    /// Resource not found
    #[error("Resource not found: {resource_type}")]
    #[diagnostic(
        code(api::not_found),
        help("The {resource_type} with ID '{resource_id}' does not exist")
    )]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    /// Conflict with existing resource
    #[error("Resource conflict: {message}")]
    #[diagnostic(
        code(api::conflict),
        help("The resource already exists or is in a conflicting state")
    )]
    Conflict { message: String },

    /// The caller has no assignment yet
    #[error("{message}")]
    #[diagnostic(
        code(api::no_assignment),
        help("Assignments have not been generated yet")
    )]
    NoAssignment { message: String },

    /// A generation run was requested with too few participants
    #[error("{message}")]
    #[diagnostic(
        code(api::insufficient_participants),
        help("At least two non-admin users are required")
    )]
    InsufficientParticipants { message: String, found: usize },

    /// Database error from santa-core
    #[error("{message}")]
    #[diagnostic(code(api::database_error), help("Database operation failed"))]
    Database { message: String, json: String },

    /// Core error from santa-core
    #[error("{message}")]
    #[diagnostic(code(api::core_error), help("Core operation failed"))]
    Core { message: String, json: String },

    /// JSON error
    #[error("{message}")]
    #[diagnostic(
        code(api::json_error),
        help("Check that your JSON is valid and matches the expected schema")
    )]
    Json { message: String, json: String },

    /// Malformed typed id in a path
    #[error("Invalid ID: {0}")]
    #[diagnostic(
        code(api::invalid_id),
        help("IDs look like user_<uuid>")
    )]
    InvalidId(String),

    /// Service temporarily unavailable
    #[error("Service temporarily unavailable")]
    #[diagnostic(
        code(api::service_unavailable),
        help("The service is temporarily unable to handle requests")
    )]
    ServiceUnavailable { retry_after_seconds: Option<u64> },
}

/// Field-level validation error
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::Forbidden { .. } => 403,
            ApiError::NotFound { .. } => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::NoAssignment { .. } => 409,
            ApiError::InsufficientParticipants { .. } => 400,
            ApiError::ServiceUnavailable { .. } => 503,

            // Santa-core errors
            ApiError::Database { .. } => 500,
            ApiError::Core { .. } => 500,

            // External errors
            ApiError::Json { .. } => 400,
            ApiError::InvalidId(_) => 400,
        }
    }

    /// Machine-readable error type used in the response body
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::Forbidden { .. } => "forbidden",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::NoAssignment { .. } => "no_assignment",
            ApiError::InsufficientParticipants { .. } => "insufficient_participants",
            ApiError::Database { .. } => "database_error",
            ApiError::Core { .. } => "core_error",
            ApiError::Json { .. } => "json_error",
            ApiError::InvalidId(_) => "invalid_id",
            ApiError::ServiceUnavailable { .. } => "service_unavailable",
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            fields: None,
        }
    }

    /// Create a validation error with field-specific errors
    pub fn validation_with_fields(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self::ValidationError {
            message: message.into(),
            fields: Some(fields),
        }
    }

    /// Create a not found error
    pub fn not_found(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: Some(message.into()),
        }
    }
}

fn render_json(err: &dyn Diagnostic) -> String {
    let handler = JSONReportHandler::new();
    let mut json = String::new();
    handler.render_report(&mut json, err).unwrap_or_default();
    json
}

// Conversion implementations
impl From<santa_core::db::DatabaseError> for ApiError {
    fn from(err: santa_core::db::DatabaseError) -> Self {
        Self::Database {
            message: err.to_string(),
            json: render_json(&err),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientParticipants { found } => Self::InsufficientParticipants {
                message: err.to_string(),
                found,
            },
            CoreError::NoAssignment { .. } => Self::NoAssignment {
                message: err.to_string(),
            },
            CoreError::UserNotFound { user_id } => Self::not_found("user", user_id),
            CoreError::UsernameTaken { .. } | CoreError::LastAdministrator { .. } => {
                Self::Conflict {
                    message: err.to_string(),
                }
            }
            CoreError::InvalidUser { field, reason } => Self::validation_with_fields(
                format!("Invalid {}", field),
                vec![FieldError {
                    field,
                    message: reason,
                }],
            ),
            CoreError::Database(err) => Self::from(err),
            CoreError::GenerationRetryExhausted { .. } => Self::Core {
                message: err.to_string(),
                json: render_json(&err),
            },
        }
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        Self::InvalidId(err.to_string())
    }
}

/// Request bodies that fail to parse or do not match the expected shape
#[cfg(feature = "server")]
impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        use axum::extract::rejection::JsonRejection;

        let message = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => Self::validation(message),
            _ => {
                let diagnostic = miette::miette!(
                    code = "json::parse_error",
                    help = "Send a JSON body with `Content-Type: application/json`",
                    "{}",
                    message
                );
                Self::Json {
                    json: render_json(&*diagnostic),
                    message,
                }
            }
        }
    }
}

// Server-side response conversion
#[cfg(feature = "server")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let detail = match &self {
            ApiError::Database { json, .. }
            | ApiError::Core { json, .. }
            | ApiError::Json { json, .. } => Some(json.clone()),
            ApiError::ValidationError {
                fields: Some(fields),
                ..
            } => serde_json::to_string(fields).ok(),
            _ => None,
        };

        let mut error_obj = serde_json::json!({
            "type": self.error_type(),
            "message": self.to_string(),
        });

        if let Some(d) = detail {
            error_obj["detail"] = serde_json::Value::String(d);
        }

        let body = serde_json::json!({
            "error": error_obj,
            "timestamp": chrono::Utc::now(),
        });

        (status, Json(body)).into_response()
    }
}
