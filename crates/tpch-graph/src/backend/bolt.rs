//! Neo4j and Memgraph over Bolt
//!
//! Both databases speak Cypher over Bolt and share this backend. They
//! differ in index DDL and in how storage figures are reported, which is
//! what [`BoltFlavor`] switches on.

use async_trait::async_trait;
use neo4rs::{query, BoltType, ConfigBuilder, Graph};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use super::{BackendKind, GraphBackend, QueryOutput, StorageInfo};
use crate::error::{BenchError, Result};
use crate::model::{Edge, Label, Node, NodeKey, NodeRef, PropertyValue, RelType};
use crate::schema::{self, IndexSpec};

/// Nodes deleted per statement while clearing
const CLEAR_CHUNK: usize = 10_000;

/// Bolt connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoltConfig {
    pub uri: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Database name; the server default when unset
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_fetch_size() -> usize {
    500
}

fn default_max_connections() -> usize {
    4
}

impl BoltConfig {
    pub fn neo4j() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: None,
            fetch_size: default_fetch_size(),
            max_connections: default_max_connections(),
        }
    }

    /// Memgraph runs without authentication by default
    pub fn memgraph() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            ..Self::neo4j()
        }
    }
}

/// Which Bolt server is on the other end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoltFlavor {
    Neo4j,
    Memgraph,
}

impl BoltFlavor {
    fn name(self) -> &'static str {
        match self {
            BoltFlavor::Neo4j => "Neo4j",
            BoltFlavor::Memgraph => "Memgraph",
        }
    }
}

pub struct BoltBackend {
    graph: Graph,
    flavor: BoltFlavor,
}

impl BoltBackend {
    pub async fn connect(kind: BackendKind, config: &BoltConfig) -> Result<Self> {
        let flavor = match kind {
            BackendKind::Neo4j => BoltFlavor::Neo4j,
            BackendKind::Memgraph => BoltFlavor::Memgraph,
            other => {
                return Err(BenchError::Config(format!(
                    "{other} does not speak Bolt"
                )));
            }
        };

        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .fetch_size(config.fetch_size)
            .max_connections(config.max_connections);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let graph = Graph::connect(builder.build()?).await?;
        info!("connected to {} at {}", flavor.name(), config.uri);

        Ok(Self { graph, flavor })
    }

    async fn rows(&self, text: &str) -> Result<Vec<Value>> {
        let mut stream = self.graph.execute(query(text)).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            let value = row
                .to::<Value>()
                .map_err(|e| BenchError::backend(self.flavor.name(), e.to_string()))?;
            rows.push(value);
        }
        Ok(rows)
    }

    async fn counts(&self, text: &str) -> Result<BTreeMap<String, u64>> {
        let mut counts = BTreeMap::new();
        for row in self.rows(text).await? {
            let name = row.get("name").and_then(Value::as_str).unwrap_or("").to_string();
            let count = row.get("count").and_then(Value::as_u64).unwrap_or(0);
            counts.insert(name, count);
        }
        Ok(counts)
    }
}

/// Cypher identifier, backtick quoted
fn ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn bolt_value(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Int(i) => BoltType::from(*i),
        PropertyValue::Float(f) => BoltType::from(*f),
        PropertyValue::Text(s) => BoltType::from(s.clone()),
    }
}

/// Key properties of a node reference, as a Bolt map
fn key_map(node: &NodeRef) -> HashMap<String, BoltType> {
    let names = node.label.key_properties();
    let values = match node.key {
        NodeKey::Int(k) => vec![k],
        NodeKey::Composite(a, b) => vec![a, b],
    };
    names
        .iter()
        .zip(values)
        .map(|(name, value)| (name.to_string(), BoltType::from(value)))
        .collect()
}

fn property_map(properties: &[(&'static str, PropertyValue)]) -> HashMap<String, BoltType> {
    properties
        .iter()
        .map(|(name, value)| (name.to_string(), bolt_value(value)))
        .collect()
}

/// `{k1: <prefix>.k1, k2: <prefix>.k2}`
fn key_pattern(label: Label, prefix: &str) -> String {
    let fields: Vec<String> = label
        .key_properties()
        .iter()
        .map(|k| format!("{k}: {prefix}.{k}"))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// Batched node write. Line items are never matched by key while loading,
/// so they are created; every other label is merged on its key.
pub(crate) fn node_statement(label: Label) -> String {
    match label {
        Label::LineItem => format!("UNWIND $rows AS row CREATE (n:{}) SET n = row", ident(label.name())),
        _ => format!(
            "UNWIND $rows AS row MERGE (n:{} {}) SET n += row",
            ident(label.name()),
            key_pattern(label, "row")
        ),
    }
}

/// Batched edge write between one pair of endpoint labels
pub(crate) fn edge_statement(rel: RelType, from: Label, to: Label) -> String {
    let verb = match rel {
        RelType::Contains | RelType::OfPart | RelType::SuppliedBy => "CREATE",
        _ => "MERGE",
    };
    let mut text = format!(
        "UNWIND $rows AS row MATCH (a:{} {}) MATCH (b:{} {}) {verb} (a)-[r:{}]->(b)",
        ident(from.name()),
        key_pattern(from, "row.from"),
        ident(to.name()),
        key_pattern(to, "row.to"),
        ident(rel.name()),
    );
    if !schema::edge_properties(rel).is_empty() {
        text.push_str(" SET r += row.props");
    }
    text
}

/// Index DDL. Memgraph has no named or composite label-property indexes,
/// so one index per property is created instead.
pub(crate) fn create_index_statements(flavor: BoltFlavor, index: &IndexSpec) -> Vec<String> {
    let label = ident(index.label.name());
    match flavor {
        BoltFlavor::Neo4j => {
            let props: Vec<String> = index.properties.iter().map(|p| format!("n.{p}")).collect();
            vec![format!(
                "CREATE INDEX {} IF NOT EXISTS FOR (n:{label}) ON ({})",
                ident(index.name),
                props.join(", ")
            )]
        }
        BoltFlavor::Memgraph => index
            .properties
            .iter()
            .map(|p| format!("CREATE INDEX ON :{label}({p})"))
            .collect(),
    }
}

fn memgraph_index_property(row: &Value) -> Vec<String> {
    match row.get("property") {
        Some(Value::String(p)) => vec![p.clone()],
        Some(Value::Array(ps)) => ps.iter().filter_map(Value::as_str).map(String::from).collect(),
        _ => Vec::new(),
    }
}

/// Bytes in a Memgraph size figure such as `"104.46KiB"`, or a plain integer
pub(crate) fn memgraph_size(value: &Value) -> Option<u64> {
    if let Some(bytes) = value.as_u64() {
        return Some(bytes);
    }
    let text = value.as_str()?.trim();
    let split = text.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let number: f64 = number.trim().parse().ok()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    let scale = match unit.trim() {
        "" | "B" => 1u64,
        "KiB" => 1 << 10,
        "MiB" => 1 << 20,
        "GiB" => 1 << 30,
        "TiB" => 1 << 40,
        _ => return None,
    };
    Some((number * scale as f64).round() as u64)
}

/// Folds `SHOW STORAGE INFO` rows into `info`. Memgraph keeps the graph in
/// memory, so `memory_res` stands in when nothing is on disk yet.
pub(crate) fn apply_memgraph_storage(rows: Vec<Value>, info: &mut StorageInfo) {
    let mut disk = None;
    let mut memory = None;
    for row in rows {
        let key = row
            .get("storage info")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let value = row.get("value").cloned().unwrap_or(Value::Null);
        match key.as_str() {
            "disk_usage" => disk = memgraph_size(&value),
            "memory_res" => memory = memgraph_size(&value),
            _ => {}
        }
        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        info.details.insert(key, text);
    }
    info.bytes = disk.filter(|&bytes| bytes > 0).or(memory);
}

#[async_trait]
impl GraphBackend for BoltBackend {
    fn kind(&self) -> BackendKind {
        match self.flavor {
            BoltFlavor::Neo4j => BackendKind::Neo4j,
            BoltFlavor::Memgraph => BackendKind::Memgraph,
        }
    }

    async fn clear(&mut self) -> Result<()> {
        let text = format!(
            "MATCH (n) WITH n LIMIT {CLEAR_CHUNK} DETACH DELETE n RETURN count(*) AS deleted"
        );
        let mut total = 0;
        loop {
            let deleted = self
                .rows(&text)
                .await?
                .first()
                .and_then(|r| r.get("deleted"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            if deleted == 0 {
                break;
            }
            total += deleted;
            debug!("deleted {} nodes", total);
        }
        info!("cleared {} nodes from {}", total, self.flavor.name());
        self.drop_indexes().await
    }

    async fn setup(&mut self) -> Result<()> {
        for index in schema::key_indexes() {
            if let Err(e) = self.create_index(index).await {
                warn!("failed to create index {}: {}", index.name, e);
            }
        }
        Ok(())
    }

    async fn drop_indexes(&mut self) -> Result<()> {
        match self.flavor {
            BoltFlavor::Neo4j => {
                let rows = self
                    .rows("SHOW INDEXES YIELD name, type WHERE type <> 'LOOKUP' RETURN name")
                    .await?;
                for name in rows.iter().filter_map(|r| r.get("name").and_then(Value::as_str)) {
                    debug!("dropping index {}", name);
                    self.graph
                        .run(query(&format!("DROP INDEX {} IF EXISTS", ident(name))))
                        .await?;
                }
            }
            BoltFlavor::Memgraph => {
                for row in self.rows("SHOW INDEX INFO").await? {
                    let Some(label) = row.get("label").and_then(Value::as_str) else {
                        continue;
                    };
                    let label = ident(label);
                    let props = memgraph_index_property(&row);
                    let text = if props.is_empty() {
                        format!("DROP INDEX ON :{label}")
                    } else {
                        format!("DROP INDEX ON :{label}({})", props.join(", "))
                    };
                    debug!("{}", text);
                    self.graph.run(query(&text)).await?;
                }
            }
        }
        Ok(())
    }

    async fn create_index(&mut self, index: &IndexSpec) -> Result<()> {
        for text in create_index_statements(self.flavor, index) {
            debug!("{}", text);
            self.graph.run(query(&text)).await?;
        }
        if self.flavor == BoltFlavor::Neo4j {
            // New indexes are populated in the background
            self.graph.run(query("CALL db.awaitIndexes(300)")).await?;
        }
        Ok(())
    }

    async fn write_nodes(&mut self, label: Label, nodes: &[Node]) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        let rows: Vec<HashMap<String, BoltType>> =
            nodes.iter().map(|n| property_map(&n.properties)).collect();
        self.graph
            .run(query(&node_statement(label)).param("rows", rows))
            .await?;
        Ok(())
    }

    async fn write_edges(&mut self, rel: RelType, edges: &[Edge]) -> Result<()> {
        // A statement matches a single pair of endpoint labels
        let mut groups: BTreeMap<(Label, Label), Vec<&Edge>> = BTreeMap::new();
        for edge in edges {
            groups
                .entry((edge.from.label, edge.to.label))
                .or_default()
                .push(edge);
        }

        for ((from, to), group) in groups {
            let rows: Vec<HashMap<String, BoltType>> = group
                .iter()
                .map(|e| {
                    let mut row = HashMap::new();
                    row.insert("from".to_string(), BoltType::from(key_map(&e.from)));
                    row.insert("to".to_string(), BoltType::from(key_map(&e.to)));
                    row.insert("props".to_string(), BoltType::from(property_map(&e.properties)));
                    row
                })
                .collect();
            self.graph
                .run(query(&edge_statement(rel, from, to)).param("rows", rows))
                .await?;
        }
        Ok(())
    }

    async fn execute(&mut self, text: &str) -> Result<QueryOutput> {
        Ok(QueryOutput::from_rows(self.rows(text).await?))
    }

    async fn storage_info(&mut self) -> Result<StorageInfo> {
        let mut info = StorageInfo {
            nodes: self
                .counts("MATCH (n) RETURN labels(n)[0] AS name, count(*) AS count")
                .await?,
            edges: self
                .counts("MATCH ()-[r]->() RETURN type(r) AS name, count(*) AS count")
                .await?,
            ..StorageInfo::default()
        };

        if self.flavor == BoltFlavor::Memgraph {
            let rows = self.rows("SHOW STORAGE INFO").await?;
            apply_memgraph_storage(rows, &mut info);
        }
        Ok(info)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LINEITEM_KEY, ORDER_DATE};
    use serde_json::json;

    #[test]
    fn test_memgraph_size_forms() {
        assert_eq!(memgraph_size(&json!("104.46KiB")), Some(106_967));
        assert_eq!(memgraph_size(&json!("1.5 MiB")), Some(1_572_864));
        assert_eq!(memgraph_size(&json!("512B")), Some(512));
        assert_eq!(memgraph_size(&json!(4096)), Some(4096));
        assert_eq!(memgraph_size(&json!("4096")), Some(4096));
        assert_eq!(memgraph_size(&json!("lots")), None);
        assert_eq!(memgraph_size(&json!("3 parsecs")), None);
        assert_eq!(memgraph_size(&Value::Null), None);
    }

    #[test]
    fn test_memgraph_storage_prefers_disk_usage() {
        let rows = vec![
            json!({"storage info": "vertex_count", "value": 30}),
            json!({"storage info": "disk_usage", "value": "104.46KiB"}),
            json!({"storage info": "memory_res", "value": "43.16MiB"}),
        ];
        let mut info = StorageInfo::default();
        apply_memgraph_storage(rows, &mut info);

        assert_eq!(info.bytes, Some(106_967));
        assert_eq!(info.details["disk_usage"], "104.46KiB");
        assert_eq!(info.details["vertex_count"], "30");
    }

    #[test]
    fn test_memgraph_storage_falls_back_to_memory() {
        let rows = vec![
            json!({"storage info": "disk_usage", "value": "0B"}),
            json!({"storage info": "memory_res", "value": "2.00GiB"}),
        ];
        let mut info = StorageInfo::default();
        apply_memgraph_storage(rows, &mut info);
        assert_eq!(info.bytes, Some(2 * 1024 * 1024 * 1024));
    }

    #[test]
    fn test_node_statement() {
        assert_eq!(
            node_statement(Label::Order),
            "UNWIND $rows AS row MERGE (n:`Order` {orderkey: row.orderkey}) SET n += row"
        );
        assert_eq!(
            node_statement(Label::LineItem),
            "UNWIND $rows AS row CREATE (n:`LineItem`) SET n = row"
        );
    }

    #[test]
    fn test_edge_statement_matches_composite_keys() {
        let text = edge_statement(RelType::Contains, Label::Order, Label::LineItem);
        assert!(text.contains("MATCH (a:`Order` {orderkey: row.from.orderkey})"));
        assert!(text.contains(
            "MATCH (b:`LineItem` {orderkey: row.to.orderkey, linenumber: row.to.linenumber})"
        ));
        assert!(text.contains("CREATE (a)-[r:`CONTAINS`]->(b)"));
        assert!(!text.contains("SET"));
    }

    #[test]
    fn test_edge_statement_sets_properties() {
        let text = edge_statement(RelType::Supplies, Label::Supplier, Label::Part);
        assert!(text.contains("MERGE (a)-[r:`SUPPLIES`]->(b)"));
        assert!(text.ends_with("SET r += row.props"));
    }

    #[test]
    fn test_index_statements_per_flavor() {
        assert_eq!(
            create_index_statements(BoltFlavor::Neo4j, &LINEITEM_KEY),
            vec!["CREATE INDEX `lineitem_key` IF NOT EXISTS FOR (n:`LineItem`) ON (n.orderkey, n.linenumber)"]
        );
        assert_eq!(
            create_index_statements(BoltFlavor::Memgraph, &LINEITEM_KEY),
            vec![
                "CREATE INDEX ON :`LineItem`(orderkey)",
                "CREATE INDEX ON :`LineItem`(linenumber)"
            ]
        );
        assert_eq!(
            create_index_statements(BoltFlavor::Memgraph, &ORDER_DATE),
            vec!["CREATE INDEX ON :`Order`(orderdate)"]
        );
    }

    #[test]
    fn test_key_map_composite() {
        let map = key_map(&NodeRef::new(Label::LineItem, NodeKey::Composite(7, 3)));
        assert_eq!(map.len(), 2);
        assert_eq!(map["orderkey"], BoltType::from(7i64));
        assert_eq!(map["linenumber"], BoltType::from(3i64));
    }

    #[test]
    fn test_memgraph_index_property_forms() {
        let single = serde_json::json!({"label": "Order", "property": "orderdate"});
        let many = serde_json::json!({"label": "LineItem", "property": ["orderkey", "linenumber"]});
        let none = serde_json::json!({"label": "Order", "property": null});
        assert_eq!(memgraph_index_property(&single), vec!["orderdate"]);
        assert_eq!(memgraph_index_property(&many), vec!["orderkey", "linenumber"]);
        assert!(memgraph_index_property(&none).is_empty());
    }
}
