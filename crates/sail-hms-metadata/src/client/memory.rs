//! In-memory metastore client

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{HiveDatabase, HivePartition, HiveTable, MetastoreClient};
use crate::error::{HmsError, HmsResult};
use crate::types::format_partition_spec;

#[derive(Debug, Default)]
struct StoredTable {
    table: HiveTable,
    partitions: Vec<HivePartition>,
}

impl StoredTable {
    fn partition_name(&self, values: &[String]) -> String {
        let spec: Vec<_> = self
            .table
            .partition_column_names
            .iter()
            .zip(values)
            .collect();
        format_partition_spec(&spec)
    }
}

#[derive(Debug, Default)]
struct State {
    databases: BTreeMap<String, HiveDatabase>,
    tables: BTreeMap<(String, String), StoredTable>,
}

/// Metastore client that keeps records in process memory.
///
/// Names are matched case-insensitively, as HMS does; records are returned
/// exactly as they were stored.
#[derive(Debug, Default)]
pub struct InMemoryMetastore {
    state: RwLock<State>,
}

impl InMemoryMetastore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn table_key(db_name: &str, table_name: &str) -> (String, String) {
    (db_name.to_lowercase(), table_name.to_lowercase())
}

fn table_not_found(db_name: &str, table_name: &str) -> HmsError {
    HmsError::TableNotFound {
        database: db_name.to_string(),
        table: table_name.to_string(),
    }
}

#[async_trait]
impl MetastoreClient for InMemoryMetastore {
    async fn create_database(
        &self,
        database: HiveDatabase,
        ignore_if_exists: bool,
    ) -> HmsResult<()> {
        let mut state = self.state.write().await;
        let key = database.name.to_lowercase();
        if state.databases.contains_key(&key) {
            if ignore_if_exists {
                return Ok(());
            }
            return Err(HmsError::DatabaseAlreadyExists(database.name));
        }
        debug!("Storing database: {}", database.name);
        state.databases.insert(key, database);
        Ok(())
    }

    async fn get_database(&self, name: &str) -> HmsResult<HiveDatabase> {
        let state = self.state.read().await;
        state
            .databases
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| HmsError::DatabaseNotFound(name.to_string()))
    }

    async fn create_table(&self, table: HiveTable, ignore_if_exists: bool) -> HmsResult<()> {
        let mut state = self.state.write().await;
        let key = table_key(&table.db_name, &table.table_name);
        if state.tables.contains_key(&key) {
            if ignore_if_exists {
                return Ok(());
            }
            return Err(HmsError::TableAlreadyExists {
                database: table.db_name,
                table: table.table_name,
            });
        }
        debug!("Storing table: {}.{}", table.db_name, table.table_name);
        state.tables.insert(
            key,
            StoredTable {
                table,
                partitions: vec![],
            },
        );
        Ok(())
    }

    async fn get_table(&self, db_name: &str, table_name: &str) -> HmsResult<HiveTable> {
        let state = self.state.read().await;
        state
            .tables
            .get(&table_key(db_name, table_name))
            .map(|stored| stored.table.clone())
            .ok_or_else(|| table_not_found(db_name, table_name))
    }

    async fn drop_table(&self, db_name: &str, table_name: &str, if_exists: bool) -> HmsResult<()> {
        let mut state = self.state.write().await;
        match state.tables.remove(&table_key(db_name, table_name)) {
            Some(_) => Ok(()),
            None if if_exists => Ok(()),
            None => Err(table_not_found(db_name, table_name)),
        }
    }

    async fn add_partitions(
        &self,
        db_name: &str,
        table_name: &str,
        partitions: Vec<HivePartition>,
        ignore_if_exists: bool,
    ) -> HmsResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .tables
            .get_mut(&table_key(db_name, table_name))
            .ok_or_else(|| table_not_found(db_name, table_name))?;

        let width = stored.table.partition_column_names.len();
        let mut accepted: Vec<HivePartition> = Vec::with_capacity(partitions.len());
        for partition in partitions {
            if partition.values.len() != width {
                return Err(HmsError::SchemaInconsistency(format!(
                    "partition of {}.{} has {} value(s), expected {}",
                    db_name,
                    table_name,
                    partition.values.len(),
                    width
                )));
            }

            let exists = stored
                .partitions
                .iter()
                .chain(accepted.iter())
                .any(|p| p.values == partition.values);
            if exists {
                if ignore_if_exists {
                    continue;
                }
                return Err(HmsError::PartitionAlreadyExists {
                    database: db_name.to_string(),
                    table: table_name.to_string(),
                    partition: stored.partition_name(&partition.values),
                });
            }
            accepted.push(partition);
        }

        debug!(
            "Storing {} partition(s) for {}.{}",
            accepted.len(),
            db_name,
            table_name
        );
        stored.partitions.extend(accepted);
        Ok(())
    }

    async fn list_partitions(
        &self,
        db_name: &str,
        table_name: &str,
    ) -> HmsResult<Vec<HivePartition>> {
        let state = self.state.read().await;
        state
            .tables
            .get(&table_key(db_name, table_name))
            .map(|stored| stored.partitions.clone())
            .ok_or_else(|| table_not_found(db_name, table_name))
    }

    async fn reset(&self) -> HmsResult<()> {
        let mut state = self.state.write().await;
        *state = State::default();
        Ok(())
    }
}
