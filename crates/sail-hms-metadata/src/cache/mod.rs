//! Metadata caching layer for HMS
//!
//! Entries are the raw records returned by the metastore client, not the
//! normalized catalog values. Location rewriting and schema reconciliation
//! run on every read so a reloaded nameservice mapping applies to cached
//! tables immediately.

use crate::client::{HiveDatabase, HiveTable};
use crate::config::HmsCacheConfig;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Metadata cache for databases and tables
pub struct MetadataCache {
    /// Cache for database records
    databases: Cache<String, Arc<HiveDatabase>>,

    /// Cache for table records (key: "db_name.table_name")
    tables: Cache<String, Arc<HiveTable>>,

    enabled: bool,

    counters: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    database_hits: AtomicU64,
    database_misses: AtomicU64,
    table_hits: AtomicU64,
    table_misses: AtomicU64,
}

impl MetadataCache {
    /// Create a new metadata cache
    pub fn new(config: &HmsCacheConfig) -> Self {
        let databases = if config.enabled {
            Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.ttl())
                .time_to_idle(config.tti())
                .name("hms-databases")
                .build()
        } else {
            // Disabled cache with capacity 0
            Cache::builder().max_capacity(0).build()
        };

        let tables = if config.enabled {
            Cache::builder()
                .max_capacity(config.max_capacity * 10) // More tables than databases
                .time_to_live(config.ttl())
                .time_to_idle(config.tti())
                .name("hms-tables")
                .build()
        } else {
            Cache::builder().max_capacity(0).build()
        };

        Self {
            databases,
            tables,
            enabled: config.enabled,
            counters: Counters::default(),
        }
    }

    /// Get database from cache
    pub async fn get_database(&self, name: &str) -> Option<Arc<HiveDatabase>> {
        if !self.enabled {
            return None;
        }

        let result = self.databases.get(&Self::database_key(name)).await;

        if result.is_some() {
            trace!("Cache hit for database: {}", name);
            self.counters.database_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            trace!("Cache miss for database: {}", name);
            self.counters.database_misses.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    /// Put database in cache
    pub async fn put_database(&self, database: Arc<HiveDatabase>) {
        if self.enabled {
            debug!("Caching database: {}", database.name);
            self.databases
                .insert(Self::database_key(&database.name), database)
                .await;
        }
    }

    /// Invalidate database cache entry
    pub async fn invalidate_database(&self, name: &str) {
        debug!("Invalidating database cache: {}", name);
        self.databases.invalidate(&Self::database_key(name)).await;
    }

    /// Get table from cache
    pub async fn get_table(&self, db_name: &str, table_name: &str) -> Option<Arc<HiveTable>> {
        if !self.enabled {
            return None;
        }

        let result = self.tables.get(&Self::table_key(db_name, table_name)).await;

        if result.is_some() {
            trace!("Cache hit for table: {}.{}", db_name, table_name);
            self.counters.table_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            trace!("Cache miss for table: {}.{}", db_name, table_name);
            self.counters.table_misses.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    /// Put table in cache under the name it was requested with
    pub async fn put_table(&self, db_name: &str, table_name: &str, table: Arc<HiveTable>) {
        if self.enabled {
            debug!("Caching table: {}.{}", db_name, table_name);
            self.tables
                .insert(Self::table_key(db_name, table_name), table)
                .await;
        }
    }

    /// Invalidate table cache entry
    pub async fn invalidate_table(&self, db_name: &str, table_name: &str) {
        debug!("Invalidating table cache: {}.{}", db_name, table_name);
        self.tables
            .invalidate(&Self::table_key(db_name, table_name))
            .await;
    }

    /// Clear all cache entries
    pub async fn clear(&self) {
        debug!("Clearing all cache entries");
        self.databases.invalidate_all();
        self.tables.invalidate_all();

        // Wait for invalidation to complete
        self.databases.run_pending_tasks().await;
        self.tables.run_pending_tasks().await;
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.databases.run_pending_tasks().await;
        self.tables.run_pending_tasks().await;

        CacheStats {
            database_entries: self.databases.entry_count(),
            table_entries: self.tables.entry_count(),
            database_hits: self.counters.database_hits.load(Ordering::Relaxed),
            database_misses: self.counters.database_misses.load(Ordering::Relaxed),
            table_hits: self.counters.table_hits.load(Ordering::Relaxed),
            table_misses: self.counters.table_misses.load(Ordering::Relaxed),
        }
    }

    // HMS names are case-insensitive
    fn database_key(name: &str) -> String {
        name.to_lowercase()
    }

    fn table_key(db_name: &str, table_name: &str) -> String {
        format!("{}.{}", db_name, table_name).to_lowercase()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub database_entries: u64,
    pub table_entries: u64,
    pub database_hits: u64,
    pub database_misses: u64,
    pub table_hits: u64,
    pub table_misses: u64,
}

impl CacheStats {
    /// Calculate database hit rate
    pub fn database_hit_rate(&self) -> f64 {
        let total = self.database_hits + self.database_misses;
        if total == 0 {
            0.0
        } else {
            self.database_hits as f64 / total as f64
        }
    }

    /// Calculate table hit rate
    pub fn table_hit_rate(&self) -> f64 {
        let total = self.table_hits + self.table_misses;
        if total == 0 {
            0.0
        } else {
            self.table_hits as f64 / total as f64
        }
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "databases: {} entries ({:.1}% hit rate), tables: {} entries ({:.1}% hit rate)",
            self.database_entries,
            self.database_hit_rate() * 100.0,
            self.table_entries,
            self.table_hit_rate() * 100.0
        )
    }
}
