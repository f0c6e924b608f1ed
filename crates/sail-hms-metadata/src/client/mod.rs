//! Metastore client boundary
//!
//! The wire protocol used to reach the metastore lives outside this crate.
//! [`MetastoreClient`] is the contract the provider consumes, expressed in
//! terms of the records the metastore persists. Implementations store
//! exactly what they are given; normalization happens in the provider.

mod memory;

pub use memory::InMemoryMetastore;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::HmsResult;

/// Column as persisted: the type is an HMS type string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiveColumn {
    pub name: String,
    pub type_name: String,
    pub comment: Option<String>,
}

impl HiveColumn {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            comment: None,
        }
    }
}

/// Storage descriptor of a table or partition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiveStorageDescriptor {
    pub location: Option<String>,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub serde_library: Option<String>,
    pub serde_parameters: BTreeMap<String, String>,
}

/// Table record as persisted by the metastore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiveTable {
    pub db_name: String,
    pub table_name: String,
    /// `MANAGED_TABLE`, `EXTERNAL_TABLE` or `VIRTUAL_VIEW`
    pub table_type: String,
    /// Flat column list; may interleave partition and data columns
    pub columns: Vec<HiveColumn>,
    pub partition_column_names: Vec<String>,
    pub storage: HiveStorageDescriptor,
    pub parameters: BTreeMap<String, String>,
}

/// Partition record; `values` follow the table's partition column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HivePartition {
    pub values: Vec<String>,
    pub location: Option<String>,
    pub parameters: BTreeMap<String, String>,
}

/// Database record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiveDatabase {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub parameters: BTreeMap<String, String>,
}

/// Operations the provider needs from a metastore client.
///
/// Lookups of missing objects fail with the matching `*NotFound` error.
/// Creates of existing objects fail with `*AlreadyExists` unless
/// `ignore_if_exists` is set, in which case they do nothing. A failed call
/// leaves no partial state behind.
#[async_trait]
pub trait MetastoreClient: Send + Sync {
    async fn create_database(&self, database: HiveDatabase, ignore_if_exists: bool)
        -> HmsResult<()>;

    async fn get_database(&self, name: &str) -> HmsResult<HiveDatabase>;

    async fn create_table(&self, table: HiveTable, ignore_if_exists: bool) -> HmsResult<()>;

    async fn get_table(&self, db_name: &str, table_name: &str) -> HmsResult<HiveTable>;

    async fn drop_table(&self, db_name: &str, table_name: &str, if_exists: bool)
        -> HmsResult<()>;

    async fn add_partitions(
        &self,
        db_name: &str,
        table_name: &str,
        partitions: Vec<HivePartition>,
        ignore_if_exists: bool,
    ) -> HmsResult<()>;

    async fn list_partitions(&self, db_name: &str, table_name: &str)
        -> HmsResult<Vec<HivePartition>>;

    /// Drop all state (used to isolate tests sharing a client)
    async fn reset(&self) -> HmsResult<()>;
}
