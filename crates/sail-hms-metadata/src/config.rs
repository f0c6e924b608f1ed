//! Configuration for the HMS metadata layer

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::error::{HmsError, HmsResult};

/// Configuration for the HMS metadata layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmsConfig {
    /// Catalog name
    pub name: String,

    /// HMS Thrift URI (e.g., "thrift://localhost:9083")
    pub uri: String,

    /// Provider name of the metastore's own serialization format
    #[serde(default = "default_native_provider")]
    pub native_provider: String,

    /// Cache configuration
    #[serde(default)]
    pub cache: HmsCacheConfig,

    /// Hadoop configuration used to resolve HA nameservices
    #[serde(default)]
    pub hadoop: HadoopConf,
}

impl Default for HmsConfig {
    fn default() -> Self {
        Self {
            name: "hive".to_string(),
            uri: "thrift://localhost:9083".to_string(),
            native_provider: default_native_provider(),
            cache: Default::default(),
            hadoop: Default::default(),
        }
    }
}

impl HmsConfig {
    /// Validate the metastore URI and provider settings
    pub fn validate(&self) -> HmsResult<()> {
        let uri = url::Url::parse(&self.uri)?;

        if uri.scheme() != "thrift" {
            return Err(HmsError::InvalidUri(format!(
                "Expected thrift:// scheme, got: {}",
                uri.scheme()
            )));
        }

        if uri.host().is_none() {
            return Err(HmsError::InvalidUri("Missing host in URI".to_string()));
        }

        if self.native_provider.trim().is_empty() {
            return Err(HmsError::InvalidConfig(
                "native_provider must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Metadata cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmsCacheConfig {
    /// Enable metadata caching
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Maximum number of entries in cache
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,

    /// Time-to-live for cache entries in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Time-to-idle for cache entries in seconds
    #[serde(default = "default_tti")]
    pub tti_seconds: u64,
}

impl Default for HmsCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_capacity: default_max_capacity(),
            ttl_seconds: default_ttl(),
            tti_seconds: default_tti(),
        }
    }
}

impl HmsCacheConfig {
    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Get TTI as Duration
    pub fn tti(&self) -> Duration {
        Duration::from_secs(self.tti_seconds)
    }
}

/// Read-only access to a flat, dot-separated Hadoop style configuration
pub trait HadoopConfSource {
    /// Look up the raw value stored under `key`
    fn get(&self, key: &str) -> Option<&str>;
}

impl HadoopConfSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}

impl HadoopConfSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        BTreeMap::get(self, key).map(String::as_str)
    }
}

/// Snapshot of Hadoop configuration properties (e.g. the contents of `hdfs-site.xml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HadoopConf {
    properties: BTreeMap<String, String>,
}

impl HadoopConf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, returning `self` for chaining
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl HadoopConfSource for HadoopConf {
    fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for HadoopConf
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn default_native_provider() -> String {
    "hive".to_string()
}

// Default value functions for cache
fn default_cache_enabled() -> bool {
    true
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_ttl() -> u64 {
    300 // 5 minutes
}

fn default_tti() -> u64 {
    180 // 3 minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HmsConfig::default();
        assert_eq!(config.name, "hive");
        assert_eq!(config.uri, "thrift://localhost:9083");
        assert_eq!(config.native_provider, "hive");
        assert!(config.hadoop.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_uri_scheme() {
        let config = HmsConfig {
            uri: "http://localhost:9083".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HmsError::InvalidUri(_))));
    }

    #[test]
    fn test_unparseable_uri() {
        let config = HmsConfig {
            uri: "not a uri".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HmsError::UrlParse(_))));
    }

    #[test]
    fn test_empty_native_provider() {
        let config = HmsConfig {
            native_provider: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HmsError::InvalidConfig(_))));
    }

    #[test]
    fn test_cache_config() {
        let config = HmsCacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_capacity, 10_000);
        assert_eq!(config.ttl(), Duration::from_secs(300));
        assert_eq!(config.tti(), Duration::from_secs(180));
    }

    #[test]
    fn test_deserialize_with_hadoop_properties() {
        let json = r#"{
            "name": "prod",
            "uri": "thrift://metastore.internal:9083",
            "cache": { "enabled": false },
            "hadoop": {
                "dfs.nameservices": "ns1",
                "dfs.ha.namenodes.ns1": "nn1,nn2"
            }
        }"#;
        let config: HmsConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.name, "prod");
        assert_eq!(config.native_provider, "hive");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.max_capacity, 10_000);
        assert_eq!(config.hadoop.get("dfs.nameservices"), Some("ns1"));
        assert_eq!(config.hadoop.get("dfs.ha.namenodes.ns1"), Some("nn1,nn2"));
        assert_eq!(config.hadoop.get("dfs.ha.namenodes.ns2"), None);
    }

    #[test]
    fn test_hadoop_conf_sources() {
        let conf: HadoopConf = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(conf.len(), 2);
        assert_eq!(HadoopConfSource::get(&conf, "a"), Some("1"));

        let mut map = HashMap::new();
        map.insert("a".to_string(), "1".to_string());
        assert_eq!(HadoopConfSource::get(&map, "a"), Some("1"));
        assert_eq!(HadoopConfSource::get(&map, "missing"), None);
    }
}
