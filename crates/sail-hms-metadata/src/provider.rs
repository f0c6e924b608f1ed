//! HMS catalog provider implementation

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheStats, MetadataCache};
use crate::catalog::{
    CatalogColumn, CatalogDatabase, CatalogPartition, CatalogStorage, CatalogTable, TableType,
};
use crate::client::{
    HiveColumn, HiveDatabase, HivePartition, HiveStorageDescriptor, HiveTable, MetastoreClient,
};
use crate::config::{HadoopConfSource, HmsConfig};
use crate::error::{HmsError, HmsResult};
use crate::nameservice::NameserviceResolver;
use crate::schema::{
    read_provider_property, reconcile_schema, validate_partition_columns, write_provider_property,
};
use crate::types::{
    format_partition_spec, normalize_optional_string, parse_hms_type, parse_partition_spec,
    to_hms_type,
};

/// Table parameter holding the table comment. Callers set the comment
/// through [`CatalogTable::comment`], never through the properties.
const COMMENT_PROPERTY_KEY: &str = "comment";

/// HMS catalog provider
///
/// Wraps a [`MetastoreClient`] and normalizes metadata on its way out:
///
/// - schemas come back with data columns first and partition columns last,
///   in partitioning order
/// - storage locations addressed to an HA namenode are rewritten to the
///   logical nameservice
///
/// Writes store schema and location as given. The only write-side change is
/// that the native provider is not tagged in the table parameters.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sail_hms_metadata::{HmsConfig, HmsProvider, InMemoryMetastore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = HmsProvider::new(HmsConfig::default(), Arc::new(InMemoryMetastore::new()))?;
/// let table = provider.get_table("default", "events").await?;
/// println!("{} has {} columns", table.qualified_name(), table.schema.len());
/// # Ok(())
/// # }
/// ```
pub struct HmsProvider {
    /// Catalog name
    name: String,

    /// Metastore client
    client: Arc<dyn MetastoreClient>,

    /// HA nameservice mapping for location rewriting
    resolver: NameserviceResolver,

    /// Cache of raw metastore records
    cache: MetadataCache,

    /// Provider name that is never written to table parameters
    native_provider: String,
}

impl HmsProvider {
    /// Create a new HMS provider
    pub fn new(config: HmsConfig, client: Arc<dyn MetastoreClient>) -> HmsResult<Self> {
        info!("Initializing HMS provider: {}", config.name);
        config.validate()?;

        let resolver = NameserviceResolver::new(&config.hadoop);
        let cache = MetadataCache::new(&config.cache);

        info!(
            "HMS provider initialized: {} ({} HA namenode endpoint(s))",
            config.name,
            resolver.mapping().len()
        );

        Ok(Self {
            name: config.name,
            client,
            resolver,
            cache,
            native_provider: config.native_provider,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolver(&self) -> &NameserviceResolver {
        &self.resolver
    }

    /// Rebuild the nameservice mapping after the Hadoop configuration changed
    pub fn reload_hadoop_conf<C>(&self, conf: &C)
    where
        C: HadoopConfSource + ?Sized,
    {
        info!("Reloading Hadoop configuration for HMS provider: {}", self.name);
        self.resolver.reload(conf);
    }

    /// Reset the underlying client and drop all cached metadata
    pub async fn reset(&self) -> HmsResult<()> {
        info!("Resetting HMS provider: {}", self.name);
        self.client.reset().await?;
        self.cache.clear().await;
        Ok(())
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn create_database(
        &self,
        database: CatalogDatabase,
        ignore_if_exists: bool,
    ) -> HmsResult<()> {
        info!("Creating database: {}", database.name);
        let name = database.name.clone();

        let record = HiveDatabase {
            name: database.name,
            description: database.comment,
            location: database.location,
            parameters: database.properties,
        };
        self.client.create_database(record, ignore_if_exists).await?;
        self.cache.invalidate_database(&name).await;
        Ok(())
    }

    pub async fn get_database(&self, name: &str) -> HmsResult<CatalogDatabase> {
        debug!("Getting database: {}", name);

        let record = match self.cache.get_database(name).await {
            Some(cached) => cached,
            None => {
                let record = Arc::new(self.client.get_database(name).await?);
                self.cache.put_database(record.clone()).await;
                record
            }
        };

        let location = record
            .location
            .as_deref()
            .map(|location| self.resolver.rewrite(location, &record.name).into_owned());

        Ok(CatalogDatabase {
            name: record.name.clone(),
            comment: normalize_optional_string(record.description.clone()),
            location,
            properties: record.parameters.clone(),
        })
    }

    /// Persist a table definition.
    ///
    /// An existing table is an error unless `ignore_if_exists` is set, in
    /// which case nothing is written.
    pub async fn create_table(&self, table: CatalogTable, ignore_if_exists: bool) -> HmsResult<()> {
        info!("Creating table: {}", table.qualified_name());
        let (db_name, table_name) = (table.database.clone(), table.name.clone());

        let record = self.to_hive_table(table)?;
        self.client.create_table(record, ignore_if_exists).await?;
        self.cache.invalidate_table(&db_name, &table_name).await;
        Ok(())
    }

    /// Read a table definition back in canonical form
    pub async fn get_table(&self, db_name: &str, table_name: &str) -> HmsResult<CatalogTable> {
        debug!("Getting table: {}.{}", db_name, table_name);
        let record = self.get_hive_table(db_name, table_name).await?;
        self.restore_table(&record)
    }

    pub async fn drop_table(&self, db_name: &str, table_name: &str, if_exists: bool) -> HmsResult<()> {
        info!(
            "Dropping table: {}.{} (if_exists={})",
            db_name, table_name, if_exists
        );

        self.cache.invalidate_table(db_name, table_name).await;
        let result = self.client.drop_table(db_name, table_name, if_exists).await;
        // a concurrent read may have cached the record while the drop was in flight
        self.cache.invalidate_table(db_name, table_name).await;
        result
    }

    /// Persist partitions of a partitioned table.
    ///
    /// Each partition spec must name exactly the table's partition columns.
    pub async fn add_partitions(
        &self,
        db_name: &str,
        table_name: &str,
        partitions: Vec<CatalogPartition>,
        ignore_if_exists: bool,
    ) -> HmsResult<()> {
        info!(
            "Adding {} partition(s) to {}.{}",
            partitions.len(),
            db_name,
            table_name
        );

        let table = self.get_hive_table(db_name, table_name).await?;
        let records = partitions
            .into_iter()
            .map(|partition| to_hive_partition(&table, partition))
            .collect::<HmsResult<Vec<_>>>()?;

        self.client
            .add_partitions(db_name, table_name, records, ignore_if_exists)
            .await
    }

    pub async fn list_partitions(
        &self,
        db_name: &str,
        table_name: &str,
    ) -> HmsResult<Vec<CatalogPartition>> {
        debug!("Listing partitions of {}.{}", db_name, table_name);

        let table = self.get_hive_table(db_name, table_name).await?;
        let records = self.client.list_partitions(db_name, table_name).await?;
        records
            .into_iter()
            .map(|record| self.restore_partition(&table, record))
            .collect()
    }

    /// Look up a single partition by name, e.g. `year=2023/month=01`.
    /// The keys may appear in any order.
    pub async fn get_partition(
        &self,
        db_name: &str,
        table_name: &str,
        partition_name: &str,
    ) -> HmsResult<CatalogPartition> {
        debug!(
            "Getting partition {} of {}.{}",
            partition_name, db_name, table_name
        );

        let table = self.get_hive_table(db_name, table_name).await?;
        let spec = parse_partition_spec(partition_name)?;
        let values = ordered_partition_values(&table, spec)?;

        self.client
            .list_partitions(db_name, table_name)
            .await?
            .into_iter()
            .find(|record| record.values == values)
            .map(|record| self.restore_partition(&table, record))
            .transpose()?
            .ok_or_else(|| HmsError::PartitionNotFound {
                database: db_name.to_string(),
                table: table_name.to_string(),
                partition: partition_name.to_string(),
            })
    }

    async fn get_hive_table(&self, db_name: &str, table_name: &str) -> HmsResult<Arc<HiveTable>> {
        if let Some(cached) = self.cache.get_table(db_name, table_name).await {
            return Ok(cached);
        }

        let record = Arc::new(self.client.get_table(db_name, table_name).await?);
        self.cache
            .put_table(db_name, table_name, record.clone())
            .await;
        Ok(record)
    }

    fn to_hive_table(&self, table: CatalogTable) -> HmsResult<HiveTable> {
        validate_partition_columns(&table.schema, &table.partition_column_names)?;
        if table.properties.contains_key(COMMENT_PROPERTY_KEY) {
            return Err(HmsError::ReservedProperty(COMMENT_PROPERTY_KEY.to_string()));
        }

        let columns = table
            .schema
            .iter()
            .map(|column| {
                Ok(HiveColumn {
                    name: column.name.clone(),
                    type_name: to_hms_type(&column.data_type)?,
                    comment: column.comment.clone(),
                })
            })
            .collect::<HmsResult<Vec<_>>>()?;

        let mut parameters = table.properties;
        write_provider_property(
            &mut parameters,
            table.provider.as_deref(),
            &self.native_provider,
        );
        if let Some(comment) = table.comment {
            parameters.insert(COMMENT_PROPERTY_KEY.to_string(), comment);
        }

        Ok(HiveTable {
            db_name: table.database,
            table_name: table.name,
            table_type: table.table_type.as_hms_str().to_string(),
            columns,
            partition_column_names: table.partition_column_names,
            storage: HiveStorageDescriptor {
                location: table.storage.location,
                input_format: table.storage.input_format,
                output_format: table.storage.output_format,
                serde_library: table.storage.serde,
                serde_parameters: table.storage.properties,
            },
            parameters,
        })
    }

    fn restore_table(&self, record: &HiveTable) -> HmsResult<CatalogTable> {
        let qualified_name = format!("{}.{}", record.db_name, record.table_name);

        let columns = reconcile_schema(
            record.columns.iter().collect(),
            &record.partition_column_names,
        )
        .map_err(|e| match e {
            HmsError::SchemaInconsistency(msg) => {
                HmsError::SchemaInconsistency(format!("{}: {}", qualified_name, msg))
            }
            other => other,
        })?;

        let schema = columns
            .into_iter()
            .map(|column| {
                Ok(CatalogColumn {
                    name: column.name.clone(),
                    data_type: parse_hms_type(&column.type_name)?,
                    nullable: true,
                    comment: normalize_optional_string(column.comment.clone()),
                })
            })
            .collect::<HmsResult<Vec<_>>>()?;

        let table_type = TableType::from_hms_str(&record.table_type).ok_or_else(|| {
            HmsError::TypeConversion(format!(
                "Unknown table type {} for {}",
                record.table_type, qualified_name
            ))
        })?;

        let mut properties = record.parameters.clone();
        let provider = read_provider_property(&mut properties, &self.native_provider);
        let comment = normalize_optional_string(properties.remove(COMMENT_PROPERTY_KEY));

        let location = record
            .storage
            .location
            .as_deref()
            .map(|location| self.resolver.rewrite(location, &qualified_name).into_owned());

        Ok(CatalogTable {
            database: record.db_name.clone(),
            name: record.table_name.clone(),
            table_type,
            schema,
            partition_column_names: record.partition_column_names.clone(),
            provider: Some(provider),
            storage: CatalogStorage {
                location,
                input_format: record.storage.input_format.clone(),
                output_format: record.storage.output_format.clone(),
                serde: record.storage.serde_library.clone(),
                properties: record.storage.serde_parameters.clone(),
            },
            properties,
            comment,
        })
    }

    fn restore_partition(
        &self,
        table: &HiveTable,
        record: HivePartition,
    ) -> HmsResult<CatalogPartition> {
        if record.values.len() != table.partition_column_names.len() {
            return Err(HmsError::SchemaInconsistency(format!(
                "partition of {}.{} has {} value(s) for {} partition column(s)",
                table.db_name,
                table.table_name,
                record.values.len(),
                table.partition_column_names.len()
            )));
        }

        let spec: Vec<(String, String)> = table
            .partition_column_names
            .iter()
            .cloned()
            .zip(record.values)
            .collect();

        let location = record.location.map(|location| {
            let label = format!(
                "{}.{} ({})",
                table.db_name,
                table.table_name,
                format_partition_spec(&spec)
            );
            self.resolver.rewrite(&location, &label).into_owned()
        });

        Ok(CatalogPartition {
            spec,
            location,
            parameters: record.parameters,
        })
    }
}

fn to_hive_partition(table: &HiveTable, partition: CatalogPartition) -> HmsResult<HivePartition> {
    let values = ordered_partition_values(table, partition.spec)?;
    Ok(HivePartition {
        values,
        location: partition.location,
        parameters: partition.parameters,
    })
}

/// Order the values of a partition spec by the table's partition columns
fn ordered_partition_values(
    table: &HiveTable,
    spec: Vec<(String, String)>,
) -> HmsResult<Vec<String>> {
    let inconsistent = |msg: String| {
        HmsError::SchemaInconsistency(format!(
            "{}.{}: {}",
            table.db_name, table.table_name, msg
        ))
    };

    let expected = table.partition_column_names.len();
    let mut by_name: HashMap<String, String> = HashMap::with_capacity(spec.len());
    for (name, value) in spec {
        if !table.partition_column_names.contains(&name) {
            return Err(inconsistent(format!("{} is not a partition column", name)));
        }
        if by_name.insert(name.clone(), value).is_some() {
            return Err(inconsistent(format!("partition column {} given twice", name)));
        }
    }

    table
        .partition_column_names
        .iter()
        .map(|name| {
            by_name.remove(name).ok_or_else(|| {
                inconsistent(format!(
                    "missing value for partition column {} ({} expected)",
                    name, expected
                ))
            })
        })
        .collect()
}

impl std::fmt::Debug for HmsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmsProvider")
            .field("name", &self.name)
            .field("native_provider", &self.native_provider)
            .field("resolver", &self.resolver)
            .finish()
    }
}
