use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use santa_core::{MemoryStore, NewUser, UserId};
use santa_server::auth::hash_password;
use santa_server::{AppState, ServerConfig, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        let config = ServerConfig {
            jwt_secret: "integration-test-secret".to_string(),
            ..ServerConfig::default()
        };
        let state = AppState::with_store(config, Arc::new(MemoryStore::new()));
        let router = build_router(state.clone()).unwrap();
        let app = Self { router, state };
        app.add_user("Santa Admin", "admin", "admin-pw", true).await;
        app
    }

    async fn add_user(&self, name: &str, username: &str, password: &str, is_admin: bool) -> UserId {
        self.state
            .exchange
            .create_user(NewUser {
                name: name.to_string(),
                username: username.to_string(),
                password_hash: hash_password(password).unwrap(),
                is_admin,
            })
            .await
            .unwrap()
            .id
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("/api/v1{}", uri));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["access_token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database_status"], "ok");
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "admin-pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["is_admin"], true);
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "unauthorized");

    let (status, _) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request("POST", "/auth/login", None, Some(json!({ "username": "admin" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_auth_is_enforced() {
    let app = TestApp::new().await;
    app.add_user("Alice", "alice", "pw", false).await;

    let (status, _) = app.request("GET", "/user/assignment", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request("GET", "/auth/me", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.login("alice", "pw").await;
    let (status, body) = app.request("GET", "/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["type"], "forbidden");

    let (status, body) = app.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "participant");
}

#[tokio::test]
async fn test_batch_create_users() {
    let app = TestApp::new().await;
    let admin = app.login("admin", "admin-pw").await;

    let (status, body) = app
        .request(
            "POST",
            "/admin/users",
            Some(&admin),
            Some(json!({
                "users": [
                    { "name": "Alice", "username": "alice", "password": "pw" },
                    { "name": "Bob", "username": "bob" },
                    { "name": "Admin Again", "username": "admin", "password": "pw" },
                    { "name": "Carol", "username": "carol", "password": "pw" }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], json!(["alice", "carol"]));
    assert_eq!(
        body["errors"],
        json!([
            "Missing required fields for user: bob",
            "Username admin already exists"
        ])
    );

    let (status, _) = app
        .request("POST", "/admin/users", Some(&admin), Some(json!({ "users": [] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // New accounts can log in straight away
    app.login("carol", "pw").await;
}

#[tokio::test]
async fn test_generation_and_reveal_flow() {
    let app = TestApp::new().await;
    let admin = app.login("admin", "admin-pw").await;
    app.add_user("Alice", "alice", "pw", false).await;

    let alice = app.login("alice", "pw").await;
    let (status, body) = app.request("GET", "/user/assignment", Some(&alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "no_assignment");

    let (status, body) = app
        .request("POST", "/admin/assignments", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "insufficient_participants");

    let bob_id = app.add_user("Bob", "bob", "pw", false).await;
    let (status, body) = app
        .request("POST", "/admin/assignments", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (status, body) = app.request("GET", "/user/assignment", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigned_to"], "Bob");
    assert_eq!(body["receiver_id"], bob_id.to_string());
    assert_eq!(body["has_viewed"], false);

    // Reading twice does not mark it viewed
    let (_, body) = app.request("GET", "/user/assignment", Some(&alice), None).await;
    assert_eq!(body["has_viewed"], false);

    let (status, body) = app
        .request("POST", "/user/assignment/viewed", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "has_viewed": true, "changed": true }));

    let (_, body) = app
        .request("POST", "/user/assignment/viewed", Some(&alice), None)
        .await;
    assert_eq!(body, json!({ "has_viewed": true, "changed": false }));

    let (_, body) = app.request("GET", "/admin/users", Some(&admin), None).await;
    let alice_row = body
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["username"] == "alice")
        .unwrap();
    assert_eq!(alice_row["has_assignment"], true);
    assert_eq!(alice_row["has_viewed"], true);

    let (_, body) = app
        .request("GET", "/admin/assignments", Some(&admin), None)
        .await;
    assert_eq!(
        body[0],
        json!({
            "giver_id": body[0]["giver_id"],
            "giver": "Alice",
            "receiver_id": bob_id.to_string(),
            "receiver": "Bob",
            "has_viewed": true
        })
    );

    let (_, body) = app.request("GET", "/user/users", Some(&alice), None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_user() {
    let app = TestApp::new().await;
    let admin = app.login("admin", "admin-pw").await;
    app.add_user("Alice", "alice", "pw", false).await;
    let bob_id = app.add_user("Bob", "bob", "pw", false).await;
    let alice = app.login("alice", "pw").await;
    let bob = app.login("bob", "pw").await;

    app.request("POST", "/admin/assignments", Some(&admin), None)
        .await;

    let (status, _) = app
        .request("DELETE", &format!("/admin/users/{}", bob_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request("GET", "/user/assignment", Some(&alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "no_assignment");

    let (status, _) = app.request("GET", "/user/assignment", Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request("DELETE", &format!("/admin/users/{}", bob_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .request("DELETE", "/admin/users/not-an-id", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_id");
}

#[tokio::test]
async fn test_last_admin_is_protected() {
    let app = TestApp::new().await;
    let admin = app.login("admin", "admin-pw").await;
    let (_, me) = app.request("GET", "/auth/me", Some(&admin), None).await;
    let admin_id = me["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request("DELETE", &format!("/admin/users/{}", admin_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "conflict");
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    let admin = app.login("admin", "admin-pw").await;
    let alice_id = app.add_user("Alice", "alice", "old-pw", false).await;

    let (status, _) = app
        .request(
            "PUT",
            &format!("/admin/users/{}/password", alice_id),
            Some(&admin),
            Some(json!({ "new_password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "PUT",
            &format!("/admin/users/{}/password", alice_id),
            Some(&admin),
            Some(json!({ "new_password": "new-pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.login("alice", "new-pw").await;

    let (status, _) = app
        .request(
            "PUT",
            &format!("/admin/users/{}/password", UserId::generate()),
            Some(&admin),
            Some(json!({ "new_password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["type"], "json_error");
    assert!(body["error"]["message"].is_string());
    assert!(body["timestamp"].is_string());

    let token = app.login("admin", "admin-pw").await;
    let (status, body) = app
        .request("POST", "/admin/users", Some(&token), Some(json!({ "users": 5 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "validation_error");
}
