//! SurrealDB persistence
//!
//! This module provides:
//! - Connection management ([`connect`], [`DatabaseConfig`])
//! - Schema definitions and versioned migrations
//! - The [`SurrealStore`] implementation of [`crate::store::SantaStore`]

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use thiserror::Error;

pub mod migration;
pub mod schema;
pub mod surreal;

pub use surreal::SurrealStore;

/// Core database error type
#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("Connection failed")]
    #[diagnostic(
        code(santa_core::db::connection_failed),
        help("Check your database configuration and ensure the database is reachable")
    )]
    ConnectionFailed(#[source] surrealdb::Error),

    #[error("Query failed")]
    #[diagnostic(
        code(santa_core::db::query_failed),
        help("Check the query syntax and table schema")
    )]
    QueryFailed(#[source] surrealdb::Error),

    #[error("Transaction failed")]
    #[diagnostic(
        code(santa_core::db::transaction_failed),
        help("No changes were committed")
    )]
    TransactionFailed(#[source] surrealdb::Error),

    #[error("Corrupt record in {table}: {reason}")]
    #[diagnostic(code(santa_core::db::corrupt_record))]
    CorruptRecord { table: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Where and how to connect
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Any SurrealDB endpoint: `memory`, `surrealkv://path`, `ws://host:port`
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Root credentials for remote servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_url() -> String {
    "surrealkv://./santa.db".to_string()
}

fn default_namespace() -> String {
    "santa".to_string()
}

fn default_database() -> String {
    "main".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            namespace: default_namespace(),
            database: default_database(),
            username: None,
            password: None,
        }
    }
}

impl DatabaseConfig {
    /// Volatile in-memory database, used by tests and throwaway runs
    pub fn in_memory() -> Self {
        Self {
            url: "memory".to_string(),
            ..Self::default()
        }
    }
}

/// Connect, select namespace/database and bring the schema up to date.
pub async fn connect(config: &DatabaseConfig) -> Result<Surreal<Any>> {
    tracing::info!(
        url = %config.url,
        namespace = %config.namespace,
        database = %config.database,
        "Connecting to SurrealDB"
    );
    let connect_start = std::time::Instant::now();

    let db = any::connect(config.url.as_str())
        .await
        .map_err(DatabaseError::ConnectionFailed)?;

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        db.signin(Root {
            username: username.as_str(),
            password: password.as_str(),
        })
        .await
        .map_err(DatabaseError::ConnectionFailed)?;
    }

    db.use_ns(config.namespace.as_str())
        .use_db(config.database.as_str())
        .await
        .map_err(DatabaseError::ConnectionFailed)?;

    migration::MigrationRunner::run(&db).await?;
    tracing::info!("Database ready in {:?}", connect_start.elapsed());

    Ok(db)
}
