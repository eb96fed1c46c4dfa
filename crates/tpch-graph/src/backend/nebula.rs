//! NebulaGraph through nebula-http-gateway
//!
//! The gateway holds a graphd session per cookie: `/api/db/connect` opens
//! it, `/api/db/exec` runs nGQL and `/api/db/disconnect` releases it.
//! Schema changes in NebulaGraph are applied asynchronously, so every DDL
//! phase is followed by a wait of `schema_wait_secs` (two heartbeats on a
//! default deployment).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::{BackendKind, GraphBackend, QueryOutput, StorageInfo};
use crate::error::{BenchError, Result};
use crate::model::{Edge, Label, Node, PropertyValue, RelType};
use crate::schema::{self, IndexSpec, PropertyType};

const NAME: &str = "NebulaGraph";

/// Width of `FIXED_STRING` vertex ids
const VID_LENGTH: usize = 32;

/// Prefix length of string properties in tag indexes
const STRING_INDEX_LENGTH: usize = 64;

const JOB_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// NebulaGraph connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NebulaConfig {
    /// nebula-http-gateway base URL
    pub gateway_url: String,
    /// graphd address as seen from the gateway
    pub graphd_host: String,
    pub graphd_port: u16,
    pub username: String,
    pub password: String,
    pub space: String,
    pub partition_num: u32,
    pub replica_factor: u32,
    /// Wait after DDL for the schema to reach every graphd/storaged
    pub schema_wait_secs: u64,
    /// Upper bound for index rebuild and stats jobs
    pub job_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for NebulaConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:8080".to_string(),
            graphd_host: "graphd".to_string(),
            graphd_port: 9669,
            username: "root".to_string(),
            password: "nebula".to_string(),
            space: "tpch".to_string(),
            partition_num: 15,
            replica_factor: 1,
            schema_wait_secs: 20,
            job_timeout_secs: 600,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    code: i64,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExecData {
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    tables: Vec<Value>,
}

pub struct NebulaBackend {
    client: Client,
    base: Url,
    config: NebulaConfig,
}

impl NebulaBackend {
    /// Open a gateway session against graphd
    pub async fn connect(config: &NebulaConfig) -> Result<Self> {
        let base = Url::parse(&config.gateway_url)?;
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tpch-graph/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let backend = Self {
            client,
            base,
            config: config.clone(),
        };
        backend
            .call(
                "/api/db/connect",
                json!({
                    "username": config.username,
                    "password": config.password,
                    "address": config.graphd_host,
                    "port": config.graphd_port,
                }),
            )
            .await?;
        info!(
            "connected to NebulaGraph {}:{} via {}",
            config.graphd_host, config.graphd_port, config.gateway_url
        );
        Ok(backend)
    }

    async fn call(&self, path: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.base.join(path)?)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let reply: GatewayResponse = response.json().await?;
        if reply.code != 0 {
            return Err(BenchError::backend(NAME, reply.message));
        }
        Ok(reply.data)
    }

    /// Run one nGQL statement outside any space
    async fn exec(&self, gql: &str) -> Result<ExecData> {
        debug!("nGQL: {}", gql);
        let data = self.call("/api/db/exec", json!({ "gql": gql })).await?;
        if data.is_null() {
            return Ok(ExecData::default());
        }
        Ok(serde_json::from_value(data)?)
    }

    /// Run one nGQL statement inside the benchmark space
    async fn exec_in_space(&self, gql: &str) -> Result<ExecData> {
        self.exec(&format!("USE {}; {gql}", ident(&self.config.space)))
            .await
    }

    async fn wait_for_schema(&self) {
        if self.config.schema_wait_secs > 0 {
            debug!("waiting {}s for schema propagation", self.config.schema_wait_secs);
            tokio::time::sleep(Duration::from_secs(self.config.schema_wait_secs)).await;
        }
    }

    /// Submit a job statement and poll `SHOW JOB` until it finishes
    async fn run_job(&self, statement: &str) -> Result<()> {
        let submitted = self.exec_in_space(statement).await?;
        let id = submitted
            .tables
            .first()
            .and_then(|row| row.get("New Job Id"))
            .and_then(job_id)
            .ok_or_else(|| BenchError::backend(NAME, format!("no job id returned by {statement}")))?;

        let started = Instant::now();
        loop {
            let status = self
                .exec_in_space(&format!("SHOW JOB {id}"))
                .await?
                .tables
                .first()
                .and_then(|row| row.get("Status"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match status.as_str() {
                "FINISHED" => return Ok(()),
                "FAILED" | "STOPPED" => {
                    return Err(BenchError::backend(NAME, format!("job {id} ({statement}) {status}")));
                }
                _ => {}
            }
            if started.elapsed() > Duration::from_secs(self.config.job_timeout_secs) {
                return Err(BenchError::backend(
                    NAME,
                    format!("job {id} ({statement}) did not finish in {}s", self.config.job_timeout_secs),
                ));
            }
            tokio::time::sleep(JOB_POLL_INTERVAL).await;
        }
    }
}

fn job_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// nGQL identifier, backtick quoted so names like `comment` or `type`
/// never clash with keywords
fn ident(name: &str) -> String {
    format!("`{name}`")
}

/// nGQL string literal
pub(crate) fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub(crate) fn literal(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Int(i) => i.to_string(),
        // Debug keeps the fraction, so whole numbers still read as doubles
        PropertyValue::Float(f) => format!("{f:?}"),
        PropertyValue::Text(s) => string_literal(s),
    }
}

fn column_type(t: PropertyType) -> &'static str {
    match t {
        PropertyType::Int => "int64",
        PropertyType::Float => "double",
        PropertyType::Text => "string",
    }
}

fn column_list(props: &[(&'static str, PropertyType)], typed: bool) -> String {
    props
        .iter()
        .map(|(name, t)| {
            if typed {
                format!("{} {}", ident(name), column_type(*t))
            } else {
                ident(name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn space_ddl(config: &NebulaConfig) -> String {
    format!(
        "CREATE SPACE IF NOT EXISTS {}(partition_num = {}, replica_factor = {}, vid_type = FIXED_STRING({VID_LENGTH}))",
        ident(&config.space),
        config.partition_num,
        config.replica_factor
    )
}

pub(crate) fn tag_ddl(label: Label) -> String {
    format!(
        "CREATE TAG IF NOT EXISTS {}({})",
        ident(label.name()),
        column_list(schema::node_properties(label), true)
    )
}

pub(crate) fn edge_ddl(rel: RelType) -> String {
    format!(
        "CREATE EDGE IF NOT EXISTS {}({})",
        ident(rel.name()),
        column_list(schema::edge_properties(rel), true)
    )
}

fn scan_index_name(label: Label) -> String {
    format!("{}_scan", label.collection())
}

/// Property-less tag index; `MATCH` and `LOOKUP` need one to scan a tag
pub(crate) fn scan_index_ddl(label: Label) -> String {
    format!(
        "CREATE TAG INDEX IF NOT EXISTS {} ON {}()",
        ident(&scan_index_name(label)),
        ident(label.name())
    )
}

pub(crate) fn index_ddl(index: &IndexSpec) -> String {
    let fields: Vec<String> = index
        .properties
        .iter()
        .map(|p| match schema::property_type(index.label, p) {
            Some(PropertyType::Text) => format!("{}({STRING_INDEX_LENGTH})", ident(p)),
            _ => ident(p),
        })
        .collect();
    format!(
        "CREATE TAG INDEX IF NOT EXISTS {} ON {}({})",
        ident(index.name),
        ident(index.label.name()),
        fields.join(", ")
    )
}

fn value_list(properties: &[(&'static str, PropertyValue)]) -> String {
    properties
        .iter()
        .map(|(_, v)| literal(v))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn insert_vertices(label: Label, nodes: &[Node]) -> String {
    let values: Vec<String> = nodes
        .iter()
        .map(|n| format!("{}:({})", string_literal(&n.node_ref().vid()), value_list(&n.properties)))
        .collect();
    format!(
        "INSERT VERTEX {}({}) VALUES {}",
        ident(label.name()),
        column_list(schema::node_properties(label), false),
        values.join(", ")
    )
}

pub(crate) fn insert_edges(rel: RelType, edges: &[Edge]) -> String {
    let values: Vec<String> = edges
        .iter()
        .map(|e| {
            format!(
                "{}->{}:({})",
                string_literal(&e.from.vid()),
                string_literal(&e.to.vid()),
                value_list(&e.properties)
            )
        })
        .collect();
    format!(
        "INSERT EDGE {}({}) VALUES {}",
        ident(rel.name()),
        column_list(schema::edge_properties(rel), false),
        values.join(", ")
    )
}

#[async_trait]
impl GraphBackend for NebulaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Nebula
    }

    async fn clear(&mut self) -> Result<()> {
        info!("dropping space {}", self.config.space);
        self.exec(&format!("DROP SPACE IF EXISTS {}", ident(&self.config.space)))
            .await?;
        self.wait_for_schema().await;
        Ok(())
    }

    async fn setup(&mut self) -> Result<()> {
        self.exec(&space_ddl(&self.config)).await?;
        self.wait_for_schema().await;

        for label in Label::ALL {
            self.exec_in_space(&tag_ddl(label)).await?;
        }
        for rel in RelType::ALL {
            self.exec_in_space(&edge_ddl(rel)).await?;
        }
        self.wait_for_schema().await;

        for label in Label::ALL {
            self.exec_in_space(&scan_index_ddl(label)).await?;
        }
        for index in schema::key_indexes() {
            if let Err(e) = self.exec_in_space(&index_ddl(index)).await {
                warn!("failed to create index {}: {}", index.name, e);
            }
        }
        self.wait_for_schema().await;
        Ok(())
    }

    async fn drop_indexes(&mut self) -> Result<()> {
        let listed = self.exec_in_space("SHOW TAG INDEXES").await?;
        let mut dropped = false;
        for row in &listed.tables {
            let Some(name) = row.get("Index Name").and_then(Value::as_str) else {
                continue;
            };
            if name.ends_with("_scan") {
                continue;
            }
            debug!("dropping tag index {}", name);
            self.exec_in_space(&format!("DROP TAG INDEX IF EXISTS {}", ident(name)))
                .await?;
            dropped = true;
        }
        if dropped {
            self.wait_for_schema().await;
        }
        Ok(())
    }

    async fn create_index(&mut self, index: &IndexSpec) -> Result<()> {
        self.exec_in_space(&index_ddl(index)).await?;
        self.wait_for_schema().await;
        // Indexes only cover data written after their creation until rebuilt
        self.run_job(&format!("REBUILD TAG INDEX {}", ident(index.name)))
            .await
    }

    async fn write_nodes(&mut self, label: Label, nodes: &[Node]) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        self.exec_in_space(&insert_vertices(label, nodes)).await?;
        Ok(())
    }

    async fn write_edges(&mut self, rel: RelType, edges: &[Edge]) -> Result<()> {
        if edges.is_empty() {
            return Ok(());
        }
        self.exec_in_space(&insert_edges(rel, edges)).await?;
        Ok(())
    }

    async fn execute(&mut self, gql: &str) -> Result<QueryOutput> {
        let data = self.exec_in_space(gql).await?;
        Ok(QueryOutput {
            columns: data.headers,
            rows: data.tables,
        })
    }

    async fn storage_info(&mut self) -> Result<StorageInfo> {
        self.run_job("SUBMIT JOB STATS").await?;
        let stats = self.exec_in_space("SHOW STATS").await?;

        let mut info = StorageInfo::default();
        for row in &stats.tables {
            let kind = row.get("Type").and_then(Value::as_str).unwrap_or_default();
            let name = row.get("Name").and_then(Value::as_str).unwrap_or_default().to_string();
            let count = row.get("Count").and_then(Value::as_u64).unwrap_or(0);
            match kind {
                "Tag" => {
                    info.nodes.insert(name, count);
                }
                "Edge" => {
                    info.edges.insert(name, count);
                }
                _ => {
                    info.details.insert(name, count.to_string());
                }
            }
        }
        Ok(info)
    }

    async fn close(&mut self) -> Result<()> {
        self.call("/api/db/disconnect", json!({})).await?;
        Ok(())
    }
}
