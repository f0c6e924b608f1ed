//! Caller-facing catalog representation
//!
//! These are the values handed to and returned from [`HmsProvider`](crate::HmsProvider).
//! They use Arrow types for columns and keep the schema in its canonical
//! shape: data columns first, partition columns last.

use arrow_schema::DataType;
use std::collections::BTreeMap;
use std::fmt;

use crate::types::format_partition_spec;

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub comment: Option<String>,
}

impl CatalogColumn {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Kind of table as recorded by the metastore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TableType {
    #[default]
    Managed,
    External,
    View,
}

impl TableType {
    /// Name of the table type in HMS
    pub fn as_hms_str(&self) -> &'static str {
        match self {
            TableType::Managed => "MANAGED_TABLE",
            TableType::External => "EXTERNAL_TABLE",
            TableType::View => "VIRTUAL_VIEW",
        }
    }

    pub fn from_hms_str(s: &str) -> Option<Self> {
        match s {
            "MANAGED_TABLE" => Some(TableType::Managed),
            "EXTERNAL_TABLE" => Some(TableType::External),
            "VIRTUAL_VIEW" => Some(TableType::View),
            _ => None,
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_hms_str())
    }
}

/// Where and how table or partition data is stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStorage {
    pub location: Option<String>,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub serde: Option<String>,
    pub properties: BTreeMap<String, String>,
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable {
    pub database: String,
    pub name: String,
    pub table_type: TableType,
    /// Ordered columns, including partition columns
    pub schema: Vec<CatalogColumn>,
    /// Partition columns in partitioning order; each must appear in `schema`
    pub partition_column_names: Vec<String>,
    /// Data source format backing the table (e.g. "hive", "parquet")
    pub provider: Option<String>,
    pub storage: CatalogStorage,
    pub properties: BTreeMap<String, String>,
    pub comment: Option<String>,
}

impl CatalogTable {
    pub fn new(
        database: impl Into<String>,
        name: impl Into<String>,
        schema: Vec<CatalogColumn>,
    ) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
            table_type: TableType::default(),
            schema,
            partition_column_names: vec![],
            provider: None,
            storage: CatalogStorage::default(),
            properties: BTreeMap::new(),
            comment: None,
        }
    }

    pub fn with_partition_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_column_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.storage.location = Some(location.into());
        self
    }

    pub fn with_table_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        self
    }

    /// `database.name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_partitioned(&self) -> bool {
        !self.partition_column_names.is_empty()
    }

    /// Columns that are not partition columns, in schema order
    pub fn data_columns(&self) -> impl Iterator<Item = &CatalogColumn> {
        self.schema
            .iter()
            .filter(|c| !self.partition_column_names.contains(&c.name))
    }
}

/// A single partition of a partitioned table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPartition {
    /// Partition column values keyed by column name, in partition column order
    pub spec: Vec<(String, String)>,
    pub location: Option<String>,
    pub parameters: BTreeMap<String, String>,
}

impl CatalogPartition {
    pub fn new<I, K, V>(spec: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            spec: spec.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Partition name such as `year=2023/month=01`
    pub fn name(&self) -> String {
        format_partition_spec(&self.spec)
    }

    pub fn value(&self, column: &str) -> Option<&str> {
        self.spec
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }
}

/// Database definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDatabase {
    pub name: String,
    pub comment: Option<String>,
    pub location: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl CatalogDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
