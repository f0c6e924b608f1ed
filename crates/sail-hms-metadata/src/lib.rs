//! Hive Metastore metadata normalization for Sail
//!
//! This crate sits between Sail's catalog and a Hive Metastore (HMS) client
//! and normalizes table metadata as it is read back:
//!
//! - **Location stabilization**: storage locations that name a physical HDFS
//!   namenode (`hdfs://host:port/...`) are rewritten to the logical HA
//!   nameservice (`hdfs://ns/...`) declared in the Hadoop configuration, so
//!   they keep working after a namenode failover.
//! - **Schema restoration**: the metastore does not preserve the interleaving
//!   of partition and data columns, so tables come back with data columns
//!   first and partition columns last, in partitioning order.
//!
//! The metastore itself is reached through the [`MetastoreClient`] trait;
//! the wire protocol is out of scope. [`InMemoryMetastore`] implements it
//! for tests and embedded use.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use arrow_schema::DataType;
//! use sail_hms_metadata::{
//!     CatalogColumn, CatalogTable, HadoopConf, HmsConfig, HmsProvider, InMemoryMetastore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HmsConfig {
//!         hadoop: HadoopConf::new()
//!             .with("dfs.nameservices", "ns1")
//!             .with("dfs.ha.namenodes.ns1", "nn1,nn2")
//!             .with("dfs.namenode.rpc-address.ns1.nn1", "nn-a:8020")
//!             .with("dfs.namenode.rpc-address.ns1.nn2", "nn-b:8020"),
//!         ..Default::default()
//!     };
//!     let provider = HmsProvider::new(config, Arc::new(InMemoryMetastore::new()))?;
//!
//!     let table = CatalogTable::new(
//!         "default",
//!         "events",
//!         vec![
//!             CatalogColumn::new("ds", DataType::Utf8),
//!             CatalogColumn::new("id", DataType::Int64),
//!         ],
//!     )
//!     .with_partition_columns(["ds"])
//!     .with_location("hdfs://nn-a:8020/warehouse/events");
//!     provider.create_table(table, false).await?;
//!
//!     let table = provider.get_table("default", "events").await?;
//!     assert_eq!(table.column_names(), vec!["id", "ds"]);
//!     assert_eq!(table.storage.location.as_deref(), Some("hdfs://ns1/warehouse/events"));
//!     Ok(())
//! }
//! ```

// Re-export commonly used types
pub use cache::CacheStats;
pub use catalog::{
    CatalogColumn, CatalogDatabase, CatalogPartition, CatalogStorage, CatalogTable, TableType,
};
pub use client::{
    HiveColumn, HiveDatabase, HivePartition, HiveStorageDescriptor, HiveTable, InMemoryMetastore,
    MetastoreClient,
};
pub use config::{HadoopConf, HadoopConfSource, HmsCacheConfig, HmsConfig};
pub use error::{HmsError, HmsResult};
pub use nameservice::{
    build_mapping, rewrite_location, Endpoint, NameserviceMapping, NameserviceResolver,
};
pub use provider::HmsProvider;
pub use schema::{reconcile_schema, PROVIDER_PROPERTY_KEY};

// Public modules
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod nameservice;
pub mod provider;
pub mod schema;
pub mod types;

// Internal modules
mod cache;
