//! Schema shape restoration and provider tagging
//!
//! The metastore does not preserve an arbitrary interleaving of partition and
//! data columns. Readers restore the canonical shape: data columns in their
//! original relative order, followed by partition columns in partitioning
//! order.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::catalog::CatalogColumn;
use crate::client::HiveColumn;
use crate::error::{HmsError, HmsResult};

/// Table parameter that records the data source provider of non-native tables
pub const PROVIDER_PROPERTY_KEY: &str = "spark.sql.sources.provider";

/// Anything with a column name
pub trait NamedColumn {
    fn column_name(&self) -> &str;
}

impl NamedColumn for HiveColumn {
    fn column_name(&self) -> &str {
        &self.name
    }
}

impl NamedColumn for CatalogColumn {
    fn column_name(&self) -> &str {
        &self.name
    }
}

impl<T: NamedColumn + ?Sized> NamedColumn for &T {
    fn column_name(&self) -> &str {
        (**self).column_name()
    }
}

/// Reorder `columns` so partition columns come last, in the order of
/// `partition_column_names`.
///
/// Fails if the schema repeats a column name, if a partition column name is
/// listed twice, or if a partition column is missing from the schema.
pub fn reconcile_schema<T: NamedColumn>(
    columns: Vec<T>,
    partition_column_names: &[String],
) -> HmsResult<Vec<T>> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in &columns {
        if !seen.insert(column.column_name()) {
            return Err(HmsError::SchemaInconsistency(format!(
                "duplicate column name in schema: {}",
                column.column_name()
            )));
        }
    }

    let mut positions = HashMap::with_capacity(partition_column_names.len());
    for (i, name) in partition_column_names.iter().enumerate() {
        if positions.insert(name.as_str(), i).is_some() {
            return Err(HmsError::SchemaInconsistency(format!(
                "duplicate partition column name: {}",
                name
            )));
        }
    }

    let total = columns.len();
    let mut data = Vec::with_capacity(total);
    let mut partitions: Vec<Option<T>> = partition_column_names.iter().map(|_| None).collect();
    for column in columns {
        match positions.get(column.column_name()) {
            Some(&i) => partitions[i] = Some(column),
            None => data.push(column),
        }
    }

    for (slot, name) in partitions.iter().zip(partition_column_names) {
        if slot.is_none() {
            return Err(HmsError::SchemaInconsistency(format!(
                "partition column {} is not in the schema",
                name
            )));
        }
    }

    data.extend(partitions.into_iter().flatten());
    debug_assert_eq!(data.len(), total);
    Ok(data)
}

/// Check that `columns` and `partition_column_names` can be reconciled
pub fn validate_partition_columns<T: NamedColumn>(
    columns: &[T],
    partition_column_names: &[String],
) -> HmsResult<()> {
    reconcile_schema(columns.iter().collect(), partition_column_names).map(|_| ())
}

pub fn is_native_provider(provider: &str, native_provider: &str) -> bool {
    provider.trim().eq_ignore_ascii_case(native_provider)
}

/// Record `provider` in the persisted table parameters.
///
/// The native provider is never written: its format is fully described by
/// the storage descriptor, and a provider tag would make the table look like
/// a foreign data source table. A missing provider is treated as native.
pub fn write_provider_property(
    parameters: &mut BTreeMap<String, String>,
    provider: Option<&str>,
    native_provider: &str,
) {
    parameters.remove(PROVIDER_PROPERTY_KEY);
    match provider {
        Some(provider) if !is_native_provider(provider, native_provider) => {
            parameters.insert(PROVIDER_PROPERTY_KEY.to_string(), provider.to_string());
        }
        _ => {}
    }
}

/// Take the provider back out of persisted table parameters, defaulting to
/// the native provider when no tag was written.
pub fn read_provider_property(
    parameters: &mut BTreeMap<String, String>,
    native_provider: &str,
) -> String {
    parameters
        .remove(PROVIDER_PROPERTY_KEY)
        .unwrap_or_else(|| native_provider.to_string())
}
