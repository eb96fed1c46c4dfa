//! Configuration file tests

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tpch_graph_cli::config::Config;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert!(config.data_dir.is_none());
    assert_eq!(config.batch_size, 1000);
    assert_eq!(config.backends.neo4j.uri, "bolt://localhost:7687");
    assert_eq!(config.backends.arangodb.database, "tpch");
    assert_eq!(config.backends.nebula.space, "tpch");
}

#[test]
fn test_config_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");
    let path = config_path.to_str();

    let mut config = Config::default();
    config.data_dir = Some(PathBuf::from("/data/tpch/sf1"));
    config.batch_size = 5000;
    config.backends.memgraph.uri = "bolt://memgraph:7687".to_string();
    config.backends.nebula.partition_num = 30;

    config.save(path).unwrap();
    assert!(config_path.exists());

    let loaded = Config::load(path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_partial_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
batch_size = 250

[backends.arangodb]
url = "http://arango:8529"
password = "secret"

[backends.neo4j]
uri = "bolt://neo4j:7687"
"#,
    )
    .unwrap();

    let loaded = Config::load(config_path.to_str()).unwrap();
    let defaults = Config::default();
    assert_eq!(loaded.batch_size, 250);
    assert_eq!(loaded.backends.arangodb.url, "http://arango:8529");
    assert_eq!(loaded.backends.arangodb.password, "secret");
    assert_eq!(loaded.backends.arangodb.database, defaults.backends.arangodb.database);
    assert_eq!(loaded.backends.neo4j.uri, "bolt://neo4j:7687");
    assert_eq!(loaded.backends.memgraph, defaults.backends.memgraph);
    assert_eq!(loaded.backends.nebula, defaults.backends.nebula);
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "batch_size = \"lots\"").unwrap();

    let err = Config::load(config_path.to_str()).unwrap_err();
    assert!(format!("{err:#}").contains("parsing"));
}

#[test]
fn test_default_path_location() {
    let path = Config::default_path();
    assert!(path.ends_with("tpch-graph/config.toml"));
}
