//! Error types for HMS metadata operations

use thiserror::Error;

/// Result type for HMS operations
pub type HmsResult<T> = Result<T, HmsError>;

/// Errors that can occur when reading or writing Hive Metastore metadata
#[derive(Debug, Error)]
pub enum HmsError {
    /// Database not found in HMS
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    /// Table not found in HMS
    #[error("table not found: {database}.{table}")]
    TableNotFound { database: String, table: String },

    /// Partition not found in HMS
    #[error("partition not found: {database}.{table} ({partition})")]
    PartitionNotFound {
        database: String,
        table: String,
        partition: String,
    },

    /// Database already exists
    #[error("database already exists: {0}")]
    DatabaseAlreadyExists(String),

    /// Table already exists
    #[error("table already exists: {database}.{table}")]
    TableAlreadyExists { database: String, table: String },

    /// Partition already exists
    #[error("partition already exists: {database}.{table} ({partition})")]
    PartitionAlreadyExists {
        database: String,
        table: String,
        partition: String,
    },

    /// Persisted columns and partition column names disagree
    #[error("schema inconsistency: {0}")]
    SchemaInconsistency(String),

    /// Type conversion error between HMS type strings and Arrow types
    #[error("type conversion error: {0}")]
    TypeConversion(String),

    /// Invalid HMS URI format
    #[error("invalid HMS URI: {0}")]
    InvalidUri(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Table property key that is managed by the provider itself
    #[error("reserved table property: {0}")]
    ReservedProperty(String),

    /// Failure reported by a [`MetastoreClient`](crate::client::MetastoreClient)
    /// implementation, e.g. a transport or protocol error of a Thrift client
    #[error("metastore client error: {0}")]
    Client(String),
}

impl HmsError {
    /// Whether the error reports a missing database, table or partition
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            HmsError::DatabaseNotFound(_)
                | HmsError::TableNotFound { .. }
                | HmsError::PartitionNotFound { .. }
        )
    }

    /// Whether the error reports a conflicting create
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            HmsError::DatabaseAlreadyExists(_)
                | HmsError::TableAlreadyExists { .. }
                | HmsError::PartitionAlreadyExists { .. }
        )
    }
}
