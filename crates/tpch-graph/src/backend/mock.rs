//! In-memory backend recording every call, for loader and runner tests

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;

use super::{BackendKind, GraphBackend, QueryOutput, StorageInfo};
use crate::error::{BenchError, Result};
use crate::model::{Edge, Label, Node, RelType};
use crate::schema::IndexSpec;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Clear,
    Setup,
    DropIndexes,
    CreateIndex(&'static str),
    Nodes(Label, usize),
    Edges(RelType, usize),
    Execute(String),
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub calls: Vec<Call>,
    /// Query texts that fail when executed
    pub failing: HashSet<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl RecordingBackend {
    pub fn executed(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Execute(_)))
            .count()
    }
}

#[async_trait]
impl GraphBackend for RecordingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Neo4j
    }

    async fn clear(&mut self) -> Result<()> {
        self.calls.push(Call::Clear);
        Ok(())
    }

    async fn setup(&mut self) -> Result<()> {
        self.calls.push(Call::Setup);
        Ok(())
    }

    async fn drop_indexes(&mut self) -> Result<()> {
        self.calls.push(Call::DropIndexes);
        Ok(())
    }

    async fn create_index(&mut self, index: &IndexSpec) -> Result<()> {
        self.calls.push(Call::CreateIndex(index.name));
        Ok(())
    }

    async fn write_nodes(&mut self, label: Label, nodes: &[Node]) -> Result<()> {
        self.calls.push(Call::Nodes(label, nodes.len()));
        self.nodes.extend_from_slice(nodes);
        Ok(())
    }

    async fn write_edges(&mut self, rel: RelType, edges: &[Edge]) -> Result<()> {
        self.calls.push(Call::Edges(rel, edges.len()));
        self.edges.extend_from_slice(edges);
        Ok(())
    }

    async fn execute(&mut self, query: &str) -> Result<QueryOutput> {
        self.calls.push(Call::Execute(query.to_string()));
        if self.failing.contains(query) {
            return Err(BenchError::backend("mock", "syntax error"));
        }
        Ok(QueryOutput::from_rows(vec![json!({"n": 1}), json!({"n": 2})]))
    }

    async fn storage_info(&mut self) -> Result<StorageInfo> {
        Ok(StorageInfo::default())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
