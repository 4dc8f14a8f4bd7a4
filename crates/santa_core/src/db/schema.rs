//! Database schema definitions

/// Table names
pub const USER_TABLE: &str = "user";
pub const ASSIGNMENT_TABLE: &str = "assignment";
pub const METADATA_TABLE: &str = "system_metadata";

/// A table and the indexes defined on it
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub schema: String,
    pub indexes: Vec<String>,
}

/// SQL schema definitions for the database
pub struct Schema;

impl Schema {
    /// Get all table definitions
    pub fn tables() -> Vec<TableDefinition> {
        vec![Self::system_metadata(), Self::users(), Self::assignments()]
    }

    /// System metadata table
    pub fn system_metadata() -> TableDefinition {
        TableDefinition {
            name: METADATA_TABLE.to_string(),
            schema: r#"
                DEFINE TABLE system_metadata SCHEMAFULL;
                DEFINE FIELD schema_version ON system_metadata TYPE int;
                DEFINE FIELD created_at ON system_metadata TYPE datetime;
                DEFINE FIELD updated_at ON system_metadata TYPE datetime;
            "#
            .to_string(),
            indexes: vec![],
        }
    }

    /// Users table. `uid` carries the `user_<uuid>` id; timestamps are RFC 3339
    /// strings written by the application.
    pub fn users() -> TableDefinition {
        TableDefinition {
            name: USER_TABLE.to_string(),
            schema: r#"
                DEFINE TABLE user SCHEMAFULL;
                DEFINE FIELD uid ON user TYPE string;
                DEFINE FIELD name ON user TYPE string;
                DEFINE FIELD username ON user TYPE string;
                DEFINE FIELD password_hash ON user TYPE string;
                DEFINE FIELD is_admin ON user TYPE bool;
                DEFINE FIELD created_at ON user TYPE string;
                DEFINE FIELD updated_at ON user TYPE string;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX user_uid ON user FIELDS uid UNIQUE".to_string(),
                "DEFINE INDEX user_username ON user FIELDS username UNIQUE".to_string(),
            ],
        }
    }

    /// Assignments table, one row per giver. The unique receiver index makes
    /// a half-applied pairing with a shared receiver impossible.
    pub fn assignments() -> TableDefinition {
        TableDefinition {
            name: ASSIGNMENT_TABLE.to_string(),
            schema: r#"
                DEFINE TABLE assignment SCHEMAFULL;
                DEFINE FIELD giver ON assignment TYPE string;
                DEFINE FIELD receiver ON assignment TYPE string;
                DEFINE FIELD has_viewed ON assignment TYPE bool;
                DEFINE FIELD assigned_at ON assignment TYPE string;
                DEFINE FIELD viewed_at ON assignment TYPE option<string>;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX assignment_giver ON assignment FIELDS giver UNIQUE".to_string(),
                "DEFINE INDEX assignment_receiver ON assignment FIELDS receiver UNIQUE"
                    .to_string(),
            ],
        }
    }
}
