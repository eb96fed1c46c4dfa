//! ArangoDB over its HTTP API
//!
//! Labels become document collections, relationship types become edge
//! collections, and a named graph ties them together so AQL graph
//! traversals (`ANY SHORTEST_PATH`, `1..1 ANY`) work.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{BackendKind, GraphBackend, QueryOutput, StorageInfo};
use crate::error::{BenchError, Result};
use crate::model::{Edge, Label, Node, PropertyValue, RelType};
use crate::schema::{self, IndexSpec};

const NAME: &str = "ArangoDB";

/// Collection type codes of the collection API
const DOCUMENT_COLLECTION: u8 = 2;
const EDGE_COLLECTION: u8 = 3;

/// Rows fetched per cursor round trip
const CURSOR_BATCH: usize = 1000;

/// ArangoDB connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArangoConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Named graph spanning every collection
    pub graph: String,
    pub timeout_secs: u64,
}

impl Default for ArangoConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8529".to_string(),
            username: "root".to_string(),
            password: "password".to_string(),
            database: "tpch".to_string(),
            graph: "tpchgraph".to_string(),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CursorPage {
    #[serde(default)]
    result: Vec<Value>,
    #[serde(default, rename = "hasMore")]
    has_more: bool,
    #[serde(default)]
    id: Option<String>,
}

pub struct ArangoBackend {
    client: Client,
    base: Url,
    config: ArangoConfig,
}

impl ArangoBackend {
    /// Connect and make sure the benchmark database exists
    pub async fn connect(config: &ArangoConfig) -> Result<Self> {
        let base = Url::parse(&config.url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tpch-graph/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let backend = Self {
            client,
            base,
            config: config.clone(),
        };
        backend.ensure_database().await?;
        info!("connected to ArangoDB at {}", config.url);
        Ok(backend)
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(&format!("/_db/{}{}", self.config.database, path))?)
    }

    fn system_url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(&format!("/_db/_system{path}"))?)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.config.username, Some(&self.config.password))
    }

    /// Send a request and return its JSON body, turning error statuses
    /// into [`BenchError::Backend`] carrying ArangoDB's `errorMessage`
    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = self.authed(request).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            if text.is_empty() {
                return Ok(Value::Null);
            }
            Ok(serde_json::from_str(&text)?)
        } else {
            Err(api_error(status, &text))
        }
    }

    async fn exists(&self, url: Url) -> Result<bool> {
        let response = self.authed(self.client.get(url)).send().await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(api_error(status, &text))
            }
        }
    }

    async fn ensure_database(&self) -> Result<()> {
        let body = self
            .send(self.client.get(self.system_url("/_api/database")?))
            .await?;
        let present = body["result"]
            .as_array()
            .is_some_and(|names| names.iter().any(|n| n.as_str() == Some(&self.config.database)));
        if !present {
            info!("creating database {}", self.config.database);
            self.send(
                self.client
                    .post(self.system_url("/_api/database")?)
                    .json(&json!({ "name": self.config.database })),
            )
            .await?;
        }
        Ok(())
    }

    async fn ensure_collection(&self, name: &str, kind: u8) -> Result<()> {
        if self.exists(self.url(&format!("/_api/collection/{name}"))?).await? {
            return Ok(());
        }
        debug!("creating collection {}", name);
        self.send(
            self.client
                .post(self.url("/_api/collection")?)
                .json(&json!({ "name": name, "type": kind })),
        )
        .await?;
        Ok(())
    }

    async fn ensure_graph(&self) -> Result<()> {
        let graph = &self.config.graph;
        if self.exists(self.url(&format!("/_api/gharial/{graph}"))?).await? {
            return Ok(());
        }
        let edge_definitions: Vec<Value> = RelType::ALL
            .into_iter()
            .map(|rel| {
                let ends = schema::edge_endpoints(rel);
                json!({
                    "collection": rel.collection(),
                    "from": ends.from.iter().map(|l| l.collection()).collect::<Vec<_>>(),
                    "to": [ends.to.collection()],
                })
            })
            .collect();
        info!("creating graph {}", graph);
        self.send(
            self.client
                .post(self.url("/_api/gharial")?)
                .json(&json!({ "name": graph, "edgeDefinitions": edge_definitions })),
        )
        .await?;
        Ok(())
    }

    /// Insert a batch of documents, failing if ArangoDB rejected any
    async fn insert(&self, collection: &str, docs: Vec<Value>) -> Result<()> {
        let total = docs.len();
        let body = self
            .send(
                self.client
                    .post(self.url(&format!("/_api/document/{collection}"))?)
                    .json(&docs),
            )
            .await?;
        let rejected: Vec<&Value> = body
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter(|r| r["error"].as_bool() == Some(true))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(first) = rejected.first() {
            return Err(BenchError::backend(
                NAME,
                format!(
                    "{} of {} documents rejected by {}: {}",
                    rejected.len(),
                    total,
                    collection,
                    first["errorMessage"].as_str().unwrap_or("unknown error")
                ),
            ));
        }
        Ok(())
    }

    /// Run an AQL query, following the cursor until it is drained
    async fn query_all(&self, aql: &str) -> Result<Vec<Value>> {
        let body = self
            .send(
                self.client
                    .post(self.url("/_api/cursor")?)
                    .json(&json!({ "query": aql, "batchSize": CURSOR_BATCH })),
            )
            .await?;
        let mut page: CursorPage = serde_json::from_value(body)?;
        let mut rows = std::mem::take(&mut page.result);
        while page.has_more {
            let id = page
                .id
                .take()
                .ok_or_else(|| BenchError::backend(NAME, "cursor has more results but no id"))?;
            let body = self
                .send(self.client.put(self.url(&format!("/_api/cursor/{id}"))?))
                .await?;
            page = serde_json::from_value(body)?;
            rows.append(&mut page.result);
        }
        Ok(rows)
    }
}

fn api_error(status: StatusCode, body: &str) -> BenchError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["errorMessage"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string());
    BenchError::backend(NAME, format!("{message} (status {})", status.as_u16()))
}

fn insert_properties(doc: &mut Map<String, Value>, properties: &[(&'static str, PropertyValue)]) {
    for (name, value) in properties {
        doc.insert(name.to_string(), Value::from(value));
    }
}

/// `{_key, ...properties}`
pub(crate) fn node_document(node: &Node) -> Value {
    let mut doc = Map::new();
    doc.insert("_key".to_string(), Value::from(node.key.to_string()));
    insert_properties(&mut doc, &node.properties);
    Value::Object(doc)
}

/// `{_from, _to, ...properties}`
pub(crate) fn edge_document(edge: &Edge) -> Value {
    let mut doc = Map::new();
    doc.insert("_from".to_string(), Value::from(edge.from.document_id()));
    doc.insert("_to".to_string(), Value::from(edge.to.document_id()));
    insert_properties(&mut doc, &edge.properties);
    Value::Object(doc)
}

fn collection_names() -> impl Iterator<Item = &'static str> {
    Label::ALL
        .into_iter()
        .map(Label::collection)
        .chain(RelType::ALL.into_iter().map(RelType::collection))
}

#[async_trait]
impl GraphBackend for ArangoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ArangoDb
    }

    async fn clear(&mut self) -> Result<()> {
        let graph = self.config.graph.clone();
        if self.exists(self.url(&format!("/_api/gharial/{graph}"))?).await? {
            info!("dropping graph {} with its collections", graph);
            self.send(
                self.client
                    .delete(self.url(&format!("/_api/gharial/{graph}"))?)
                    .query(&[("dropCollections", "true")]),
            )
            .await?;
        }
        for name in collection_names() {
            let url = self.url(&format!("/_api/collection/{name}"))?;
            if self.exists(url.clone()).await? {
                debug!("dropping collection {}", name);
                self.send(self.client.delete(url)).await?;
            }
        }
        Ok(())
    }

    async fn setup(&mut self) -> Result<()> {
        for label in Label::ALL {
            self.ensure_collection(label.collection(), DOCUMENT_COLLECTION)
                .await?;
        }
        for rel in RelType::ALL {
            self.ensure_collection(rel.collection(), EDGE_COLLECTION).await?;
        }
        for index in schema::key_indexes() {
            if let Err(e) = self.create_index(index).await {
                warn!("failed to create index {}: {}", index.name, e);
            }
        }
        self.ensure_graph().await
    }

    async fn drop_indexes(&mut self) -> Result<()> {
        for label in Label::ALL {
            let body = self
                .send(
                    self.client
                        .get(self.url("/_api/index")?)
                        .query(&[("collection", label.collection())]),
                )
                .await?;
            let indexes = body["indexes"].as_array().cloned().unwrap_or_default();
            for index in indexes {
                if matches!(index["type"].as_str(), Some("primary" | "edge")) {
                    continue;
                }
                let Some(id) = index["id"].as_str() else {
                    continue;
                };
                debug!("dropping index {}", id);
                self.send(self.client.delete(self.url(&format!("/_api/index/{id}"))?))
                    .await?;
            }
        }
        Ok(())
    }

    async fn create_index(&mut self, index: &IndexSpec) -> Result<()> {
        self.send(
            self.client
                .post(self.url("/_api/index")?)
                .query(&[("collection", index.label.collection())])
                .json(&json!({
                    "type": "persistent",
                    "name": index.name,
                    "fields": index.properties,
                    "unique": index.unique,
                })),
        )
        .await?;
        Ok(())
    }

    async fn write_nodes(&mut self, label: Label, nodes: &[Node]) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        self.insert(label.collection(), nodes.iter().map(node_document).collect())
            .await
    }

    async fn write_edges(&mut self, rel: RelType, edges: &[Edge]) -> Result<()> {
        if edges.is_empty() {
            return Ok(());
        }
        self.insert(rel.collection(), edges.iter().map(edge_document).collect())
            .await
    }

    async fn execute(&mut self, aql: &str) -> Result<QueryOutput> {
        Ok(QueryOutput::from_rows(self.query_all(aql).await?))
    }

    async fn storage_info(&mut self) -> Result<StorageInfo> {
        let mut info = StorageInfo::default();
        let mut bytes = None;
        for name in collection_names() {
            let body = self
                .send(
                    self.client
                        .get(self.url(&format!("/_api/collection/{name}/figures"))?)
                        .query(&[("details", "true")]),
                )
                .await?;
            let count = body["count"].as_u64().unwrap_or(0);
            if Label::from_collection(name).is_some() {
                info.nodes.insert(name.to_string(), count);
            } else {
                info.edges.insert(name.to_string(), count);
            }

            let figures = &body["figures"];
            for size in [figures["documentsSize"].as_u64(), figures["indexes"]["size"].as_u64()]
                .into_iter()
                .flatten()
            {
                *bytes.get_or_insert(0) += size;
            }
            if let Some(n) = figures["indexes"]["count"].as_u64() {
                info.details.insert(format!("{name}.indexes"), n.to_string());
            }
        }
        info.bytes = bytes;
        Ok(info)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
