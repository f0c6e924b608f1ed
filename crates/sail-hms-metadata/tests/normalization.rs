use std::sync::Arc;

use arrow_schema::DataType;
use sail_hms_metadata::{
    CatalogColumn, CatalogPartition, CatalogTable, HadoopConf, HmsCacheConfig, HmsConfig,
    HmsError, HmsProvider, InMemoryMetastore, MetastoreClient, PROVIDER_PROPERTY_KEY,
};

fn hadoop_conf() -> HadoopConf {
    HadoopConf::new()
        .with("dfs.nameservices", "ns1,ns2")
        .with("dfs.ha.namenodes.ns1", "namenode1,namenode5")
        .with("dfs.namenode.rpc-address.ns1.namenode1", "foo-1.xyz.com:8020")
        .with("dfs.namenode.rpc-address.ns1.namenode5", "foo-2.xyz.com:1234")
        .with("dfs.ha.namenodes.ns2", "namenode17,namenode25")
        .with("dfs.namenode.rpc-address.ns2.namenode17", "blah-1.bar.com:8020")
        .with("dfs.namenode.rpc-address.ns2.namenode25", "blah-2.bar.com:8020")
}

fn setup(cache_enabled: bool) -> (Arc<InMemoryMetastore>, HmsProvider) {
    let client = Arc::new(InMemoryMetastore::new());
    let config = HmsConfig {
        name: "test".to_string(),
        hadoop: hadoop_conf(),
        cache: HmsCacheConfig {
            enabled: cache_enabled,
            ..Default::default()
        },
        ..Default::default()
    };
    let provider = HmsProvider::new(config, client.clone()).unwrap();
    (client, provider)
}

fn table(name: &str, location: &str) -> CatalogTable {
    CatalogTable::new(
        "db1",
        name,
        vec![
            CatalogColumn::new("col1", DataType::Int32),
            CatalogColumn::new("partCol1", DataType::Utf8),
            CatalogColumn::new("partCol2", DataType::Utf8),
            CatalogColumn::new("col2", DataType::Utf8).with_comment("second data column"),
        ],
    )
    .with_partition_columns(["partCol1", "partCol2"])
    .with_location(location)
}

#[tokio::test]
async fn test_round_trip_restores_partition_column_order() {
    for cache_enabled in [true, false] {
        let (_, provider) = setup(cache_enabled);
        provider
            .create_table(table("t", "hdfs://foo-1.xyz.com:8020/warehouse/db1/t"), false)
            .await
            .unwrap();

        let restored = provider.get_table("db1", "t").await.unwrap();
        assert_eq!(
            restored.column_names(),
            vec!["col1", "col2", "partCol1", "partCol2"]
        );
        assert_eq!(restored.partition_column_names, vec!["partCol1", "partCol2"]);
        assert_eq!(
            restored.schema[1].comment.as_deref(),
            Some("second data column")
        );
    }
}

#[tokio::test]
async fn test_table_locations() {
    let (client, provider) = setup(true);
    let cases = [
        ("a", "hdfs://foo-1.xyz.com:8020/warehouse/a", "hdfs://ns1/warehouse/a"),
        ("b", "hdfs://foo-2.xyz.com:1234/warehouse/b", "hdfs://ns1/warehouse/b"),
        ("c", "hdfs://blah-1.bar.com:8020/warehouse/c", "hdfs://ns2/warehouse/c"),
        ("d", "hdfs://blah-2.bar.com:8020/warehouse/d", "hdfs://ns2/warehouse/d"),
        ("e", "hdfs://foo-1.xyz.com:8021/warehouse/e", "hdfs://foo-1.xyz.com:8021/warehouse/e"),
        ("f", "hdfs://foo-1.xyz.com/warehouse/f", "hdfs://foo-1.xyz.com/warehouse/f"),
        (
            "g",
            "hdfs://another.cluster.com:8020/warehouse/g",
            "hdfs://another.cluster.com:8020/warehouse/g",
        ),
        ("h", "file:/some/local/path", "file:/some/local/path"),
        ("i", "/bare/path", "/bare/path"),
        ("j", "hdfs://ns1/warehouse/j", "hdfs://ns1/warehouse/j"),
    ];

    for (name, location, _) in cases {
        provider.create_table(table(name, location), false).await.unwrap();
    }

    for (name, location, expected) in cases {
        let restored = provider.get_table("db1", name).await.unwrap();
        assert_eq!(restored.storage.location.as_deref(), Some(expected), "table {name}");

        // persisted state is untouched
        let raw = client.get_table("db1", name).await.unwrap();
        assert_eq!(raw.storage.location.as_deref(), Some(location));
    }
}

#[tokio::test]
async fn test_partition_locations() {
    let (client, provider) = setup(true);
    provider
        .create_table(table("t", "hdfs://ns1/warehouse/db1/t"), false)
        .await
        .unwrap();

    provider
        .add_partitions(
            "db1",
            "t",
            vec![
                CatalogPartition::new([("partCol1", "1"), ("partCol2", "x")])
                    .with_location("hdfs://blah-2.bar.com:8020/warehouse/db1/t/partCol1=1/partCol2=x"),
                CatalogPartition::new([("partCol1", "2"), ("partCol2", "y")])
                    .with_location("hdfs://blah-2.bar.com:9000/warehouse/db1/t/partCol1=2/partCol2=y"),
            ],
            false,
        )
        .await
        .unwrap();

    let partitions = provider.list_partitions("db1", "t").await.unwrap();
    let locations: Vec<_> = partitions
        .iter()
        .map(|p| p.location.as_deref().unwrap())
        .collect();
    assert_eq!(
        locations,
        vec![
            "hdfs://ns2/warehouse/db1/t/partCol1=1/partCol2=x",
            "hdfs://blah-2.bar.com:9000/warehouse/db1/t/partCol1=2/partCol2=y",
        ]
    );

    let raw = client.list_partitions("db1", "t").await.unwrap();
    assert_eq!(
        raw[0].location.as_deref(),
        Some("hdfs://blah-2.bar.com:8020/warehouse/db1/t/partCol1=1/partCol2=x")
    );
}

#[tokio::test]
async fn test_native_provider_is_not_persisted() {
    let (client, provider) = setup(true);
    provider
        .create_table(table("native", "/tmp/native").with_provider("hive"), false)
        .await
        .unwrap();
    provider
        .create_table(table("foreign", "/tmp/foreign").with_provider("json"), false)
        .await
        .unwrap();

    let native = client.get_table("db1", "native").await.unwrap();
    assert!(!native.parameters.contains_key(PROVIDER_PROPERTY_KEY));

    let foreign = client.get_table("db1", "foreign").await.unwrap();
    assert_eq!(
        foreign.parameters.get(PROVIDER_PROPERTY_KEY).map(String::as_str),
        Some("json")
    );

    assert_eq!(
        provider.get_table("db1", "native").await.unwrap().provider.as_deref(),
        Some("hive")
    );
    assert_eq!(
        provider.get_table("db1", "foreign").await.unwrap().provider.as_deref(),
        Some("json")
    );
}

#[tokio::test]
async fn test_create_conflicts() {
    let (_, provider) = setup(true);
    provider.create_table(table("t", "/tmp/t"), false).await.unwrap();

    let err = provider
        .create_table(table("t", "/tmp/other"), false)
        .await
        .unwrap_err();
    assert!(err.is_already_exists());

    provider
        .create_table(table("t", "/tmp/other"), true)
        .await
        .unwrap();
    let restored = provider.get_table("db1", "t").await.unwrap();
    assert_eq!(restored.storage.location.as_deref(), Some("/tmp/t"));
}

#[tokio::test]
async fn test_not_found_surfaces_unchanged() {
    let (_, provider) = setup(true);
    match provider.get_table("db1", "missing").await {
        Err(HmsError::TableNotFound { database, table }) => {
            assert_eq!(database, "db1");
            assert_eq!(table, "missing");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_reset_isolates_tests() {
    let (client, provider) = setup(true);
    provider.create_table(table("t", "/tmp/t"), false).await.unwrap();
    provider.get_table("db1", "t").await.unwrap();

    provider.reset().await.unwrap();
    assert!(client.get_table("db1", "t").await.is_err());
    assert!(provider.get_table("db1", "t").await.unwrap_err().is_not_found());

    provider.create_table(table("t", "/tmp/t"), false).await.unwrap();
}
