//! Administrator handlers: user management and generation runs

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use santa_api::{
    ApiError,
    requests::{ChangePasswordRequest, CreateUserEntry, CreateUsersRequest},
    responses::{
        AssignmentListEntry, CreateUsersResponse, GenerateResponse, MessageResponse,
        UserStatusResponse,
    },
};
use santa_core::{CoreError, Exchange, NewUser, UserId};

use crate::{auth::hash_password, error::ServerResult, extract::ApiJson, state::AppState};

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    Ok(UserId::parse(raw)?)
}

/// Create a batch of users. A bad entry is reported in `errors` and does
/// not stop the rest of the batch.
pub async fn create_users(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUsersRequest>,
) -> ServerResult<(StatusCode, Json<CreateUsersResponse>)> {
    if request.users.is_empty() {
        return Err(ApiError::validation("No users provided").into());
    }

    let response = create_batch(&state.exchange, &request.users, hash_password).await?;
    let status = if response.created.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(response)))
}

async fn create_batch(
    exchange: &Exchange,
    entries: &[CreateUserEntry],
    hash: impl Fn(&str) -> ServerResult<String>,
) -> ServerResult<CreateUsersResponse> {
    let mut response = CreateUsersResponse::default();
    for entry in entries {
        let entry = match entry.validate() {
            Ok(entry) => entry,
            Err(message) => {
                response.errors.push(message);
                continue;
            }
        };

        let password_hash = match hash(&entry.password) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!(username = %entry.username, error = %e, "Failed to hash password");
                response
                    .errors
                    .push(format!("Could not set password for user {}", entry.username));
                continue;
            }
        };

        let new_user = NewUser {
            name: entry.name,
            username: entry.username,
            password_hash,
            is_admin: entry.is_admin,
        };

        match exchange.create_user(new_user).await {
            Ok(user) => response.created.push(user.username),
            Err(CoreError::UsernameTaken { username }) => {
                response
                    .errors
                    .push(format!("Username {} already exists", username));
            }
            Err(e) if e.is_recoverable() => response.errors.push(e.to_string()),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(response)
}

/// Every user with their assignment flags
pub async fn list_users(
    State(state): State<AppState>,
) -> ServerResult<Json<Vec<UserStatusResponse>>> {
    let statuses = state.exchange.user_statuses().await?;
    Ok(Json(statuses.into_iter().map(Into::into).collect()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<MessageResponse>> {
    let user_id = parse_user_id(&id)?;
    let user = state.exchange.delete_user(user_id).await?;

    Ok(Json(MessageResponse::new(format!(
        "User {} deleted successfully",
        user.username
    ))))
}

pub async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> ServerResult<Json<MessageResponse>> {
    let user_id = parse_user_id(&id)?;
    if request.new_password.is_empty() {
        return Err(ApiError::validation("New password is required").into());
    }

    let password_hash = hash_password(&request.new_password)?;
    let user = state
        .exchange
        .change_password(user_id, password_hash)
        .await?;

    Ok(Json(MessageResponse::new(format!(
        "Password updated successfully for user {}",
        user.username
    ))))
}

/// Run a generation over every non-admin user
pub async fn generate_assignments(
    State(state): State<AppState>,
) -> ServerResult<Json<GenerateResponse>> {
    let summary = state.exchange.generate_assignments().await?;

    Ok(Json(GenerateResponse {
        message: "Assignments generated successfully".to_string(),
        count: summary.count,
    }))
}

pub async fn list_assignments(
    State(state): State<AppState>,
) -> ServerResult<Json<Vec<AssignmentListEntry>>> {
    let entries = state.exchange.assignment_entries().await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;
    use pretty_assertions::assert_eq;
    use santa_core::{DerangementGenerator, GeneratorConfig, MemoryStore};
    use std::sync::Arc;

    fn entry(username: &str, password: &str) -> CreateUserEntry {
        CreateUserEntry {
            name: Some(format!("{} name", username)),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_hash_failure_does_not_abort_batch() {
        let exchange = Exchange::new(
            Arc::new(MemoryStore::new()),
            DerangementGenerator::new(GeneratorConfig::default()),
        );
        let entries = [entry("alice", "pw"), entry("bob", "unhashable"), entry("carol", "pw")];

        let response = create_batch(&exchange, &entries, |password| {
            if password == "unhashable" {
                Err(ServerError::Config("hasher unavailable".to_string()))
            } else {
                Ok(format!("hash-of-{}", password))
            }
        })
        .await
        .unwrap();

        assert_eq!(response.created, vec!["alice", "carol"]);
        assert_eq!(response.errors, vec!["Could not set password for user bob"]);
        assert!(exchange.store().find_user_by_username("bob").await.unwrap().is_none());
    }
}
