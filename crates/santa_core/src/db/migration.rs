//! Database migration system for schema versioning

use super::{DatabaseError, Result};
use crate::db::schema::Schema;
use surrealdb::{Connection, Surreal};

/// Current schema version the code expects
pub const SCHEMA_VERSION: u32 = 1;

/// Database migration runner
pub struct MigrationRunner;

impl MigrationRunner {
    /// Run all migrations
    pub async fn run<C: Connection>(db: &Surreal<C>) -> Result<()> {
        let current_version = Self::get_schema_version(db).await?;

        if current_version < 1 {
            tracing::info!("Running migration v1: Initial schema");
            Self::migrate_v1(db).await?;
            Self::update_schema_version(db, 1).await?;
        }

        Ok(())
    }

    /// Migration v1: users, assignments and metadata
    async fn migrate_v1<C: Connection>(db: &Surreal<C>) -> Result<()> {
        for table in Schema::tables() {
            tracing::debug!(table = %table.name, "Defining table");
            db.query(table.schema.as_str())
                .await
                .and_then(|response| response.check())
                .map_err(DatabaseError::QueryFailed)?;

            for index in &table.indexes {
                db.query(index.as_str())
                    .await
                    .and_then(|response| response.check())
                    .map_err(DatabaseError::QueryFailed)?;
            }
        }

        Ok(())
    }

    /// Get schema version, 0 for a fresh database
    pub async fn get_schema_version<C: Connection>(db: &Surreal<C>) -> Result<u32> {
        #[derive(serde::Deserialize)]
        struct SchemaVersion {
            schema_version: u32,
        }

        let versions: Vec<SchemaVersion> = db
            .query("SELECT schema_version FROM system_metadata LIMIT 1")
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        Ok(versions.first().map(|v| v.schema_version).unwrap_or(0))
    }

    /// Update schema version
    async fn update_schema_version<C: Connection>(db: &Surreal<C>, version: u32) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct SchemaVersion {
            #[allow(dead_code)]
            schema_version: u32,
        }

        let updated: Vec<SchemaVersion> = db
            .query(
                "UPDATE system_metadata SET schema_version = $version, updated_at = time::now() \
                 RETURN schema_version",
            )
            .bind(("version", version))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        if updated.is_empty() {
            db.query(
                "CREATE system_metadata SET schema_version = $version, \
                 created_at = time::now(), updated_at = time::now()",
            )
            .bind(("version", version))
            .await
            .and_then(|response| response.check())
            .map_err(DatabaseError::QueryFailed)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseConfig, connect};

    #[tokio::test]
    async fn test_migration_runner() {
        // connect runs migrations
        let db = connect(&DatabaseConfig::in_memory()).await.unwrap();

        let version = MigrationRunner::get_schema_version(&db).await.unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        // Running migrations again should be idempotent
        MigrationRunner::run(&db).await.unwrap();
        let version = MigrationRunner::get_schema_version(&db).await.unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
