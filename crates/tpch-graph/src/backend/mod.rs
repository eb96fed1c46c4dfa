//! Database backends
//!
//! Every benchmarked database sits behind [`GraphBackend`]. The loader and
//! the query runner only ever talk to the trait; each implementation owns
//! the translation of the canonical graph ([`crate::model`]) and index
//! catalogue ([`crate::schema`]) into its vendor API.

pub mod arangodb;
pub mod bolt;
pub mod nebula;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{BenchError, Result};
use crate::model::{Edge, Label, Node, RelType};
use crate::schema::IndexSpec;

pub use arangodb::{ArangoBackend, ArangoConfig};
pub use bolt::{BoltBackend, BoltConfig};
pub use nebula::{NebulaBackend, NebulaConfig};

/// The benchmarked databases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Neo4j,
    Memgraph,
    ArangoDb,
    Nebula,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Neo4j,
        BackendKind::Memgraph,
        BackendKind::ArangoDb,
        BackendKind::Nebula,
    ];

    /// Identifier used on the command line and in config files
    pub fn id(self) -> &'static str {
        match self {
            BackendKind::Neo4j => "neo4j",
            BackendKind::Memgraph => "memgraph",
            BackendKind::ArangoDb => "arangodb",
            BackendKind::Nebula => "nebula",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BackendKind::Neo4j => "Neo4j",
            BackendKind::Memgraph => "Memgraph",
            BackendKind::ArangoDb => "ArangoDB",
            BackendKind::Nebula => "NebulaGraph",
        }
    }

    pub fn dialect(self) -> Dialect {
        match self {
            BackendKind::Neo4j | BackendKind::Memgraph => Dialect::Cypher,
            BackendKind::ArangoDb => Dialect::Aql,
            BackendKind::Nebula => Dialect::Ngql,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BackendKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neo4j" => Ok(BackendKind::Neo4j),
            "memgraph" => Ok(BackendKind::Memgraph),
            "arangodb" | "arango" => Ok(BackendKind::ArangoDb),
            "nebula" | "nebulagraph" => Ok(BackendKind::Nebula),
            other => Err(BenchError::Config(format!(
                "unknown backend '{other}' (expected one of: neo4j, memgraph, arangodb, nebula)"
            ))),
        }
    }
}

/// Query language spoken by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dialect {
    Cypher,
    Aql,
    Ngql,
}

/// Rows returned by a query. Rows are JSON objects keyed by column name,
/// or bare values when the query returns a single unnamed column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
}

impl QueryOutput {
    /// Build an output from rows, taking the column names from the first
    /// object row
    pub fn from_rows(rows: Vec<Value>) -> Self {
        let columns = match rows.first() {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            Some(_) => vec!["value".to_string()],
            None => Vec::new(),
        };
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Storage footprint of a loaded database
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StorageInfo {
    /// Node count per label (or collection / tag)
    pub nodes: BTreeMap<String, u64>,
    /// Relationship count per type (or edge collection / edge type)
    pub edges: BTreeMap<String, u64>,
    /// On-disk or in-memory size in bytes, when the database reports one
    pub bytes: Option<u64>,
    /// Vendor specific figures, verbatim
    pub details: BTreeMap<String, String>,
}

impl StorageInfo {
    pub fn total_nodes(&self) -> u64 {
        self.nodes.values().sum()
    }

    pub fn total_edges(&self) -> u64 {
        self.edges.values().sum()
    }
}

/// A benchmarked graph database
#[async_trait]
pub trait GraphBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Remove every node, relationship and index the benchmark created
    async fn clear(&mut self) -> Result<()>;

    /// Create schema objects and the key indexes the load relies on
    async fn setup(&mut self) -> Result<()>;

    /// Drop secondary indexes so that un-indexed queries run un-indexed
    async fn drop_indexes(&mut self) -> Result<()>;

    /// Create `index` if it does not exist yet and wait until it is usable
    async fn create_index(&mut self, index: &IndexSpec) -> Result<()>;

    /// Write one batch of nodes, all carrying `label`
    async fn write_nodes(&mut self, label: Label, nodes: &[Node]) -> Result<()>;

    /// Write one batch of relationships, all of type `rel`
    async fn write_edges(&mut self, rel: RelType, edges: &[Edge]) -> Result<()>;

    /// Run a query in the backend's own dialect and collect every row
    async fn execute(&mut self, query: &str) -> Result<QueryOutput>;

    async fn storage_info(&mut self) -> Result<StorageInfo>;

    async fn close(&mut self) -> Result<()>;
}

/// Connection settings for every backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default = "BoltConfig::neo4j")]
    pub neo4j: BoltConfig,
    #[serde(default = "BoltConfig::memgraph")]
    pub memgraph: BoltConfig,
    #[serde(default)]
    pub arangodb: ArangoConfig,
    #[serde(default)]
    pub nebula: NebulaConfig,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            neo4j: BoltConfig::neo4j(),
            memgraph: BoltConfig::memgraph(),
            arangodb: ArangoConfig::default(),
            nebula: NebulaConfig::default(),
        }
    }
}

/// Open a connection to `kind` using its section of `config`
pub async fn connect(kind: BackendKind, config: &BackendsConfig) -> Result<Box<dyn GraphBackend>> {
    tracing::debug!("connecting to {}", kind);
    let backend: Box<dyn GraphBackend> = match kind {
        BackendKind::Neo4j => Box::new(BoltBackend::connect(kind, &config.neo4j).await?),
        BackendKind::Memgraph => Box::new(BoltBackend::connect(kind, &config.memgraph).await?),
        BackendKind::ArangoDb => Box::new(ArangoBackend::connect(&config.arangodb).await?),
        BackendKind::Nebula => Box::new(NebulaBackend::connect(&config.nebula).await?),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("Neo4j".parse::<BackendKind>().unwrap(), BackendKind::Neo4j);
        assert_eq!("arango".parse::<BackendKind>().unwrap(), BackendKind::ArangoDb);
        assert_eq!("nebulagraph".parse::<BackendKind>().unwrap(), BackendKind::Nebula);
        assert!("janusgraph".parse::<BackendKind>().is_err());
        for kind in BackendKind::ALL {
            assert_eq!(kind.id().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_query_output_columns() {
        let out = QueryOutput::from_rows(vec![json!({"brand": "Brand#13", "n": 3})]);
        assert_eq!(out.columns, vec!["brand", "n"]);

        let out = QueryOutput::from_rows(vec![json!("AUTOMOBILE"), json!("BUILDING")]);
        assert_eq!(out.columns, vec!["value"]);
        assert_eq!(out.len(), 2);

        assert!(QueryOutput::from_rows(Vec::new()).columns.is_empty());
    }

    #[test]
    fn test_backends_config_defaults_per_section() {
        let cfg: BackendsConfig = serde_json::from_value(json!({
            "memgraph": { "uri": "bolt://memgraph:7687" }
        }))
        .unwrap();
        assert_eq!(cfg.neo4j, BoltConfig::neo4j());
        assert_eq!(cfg.memgraph.uri, "bolt://memgraph:7687");
        assert_eq!(cfg.memgraph.user, "");
        assert_eq!(cfg.arangodb.database, "tpch");
        assert_eq!(cfg.nebula.space, "tpch");
    }
}
