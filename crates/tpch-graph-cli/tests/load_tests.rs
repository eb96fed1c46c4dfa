use async_trait::async_trait;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tpch_graph::backend::{BackendKind, GraphBackend, QueryOutput, StorageInfo};
use tpch_graph::model::{Edge, Label, Node, RelType};
use tpch_graph::schema::IndexSpec;
use tpch_graph::BenchError;
use tpch_graph_cli::commands::OutputContext;
use tpch_graph_cli::commands::load::{LoadArgs, load_then_close, needs_confirmation};

/// Refuses to clear and remembers whether it was closed
struct UnclearableBackend {
    closed: Arc<AtomicBool>,
}

fn refused() -> BenchError {
    BenchError::Backend {
        backend: "NebulaGraph",
        message: "space is locked".to_string(),
    }
}

#[async_trait]
impl GraphBackend for UnclearableBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Nebula
    }

    async fn clear(&mut self) -> tpch_graph::Result<()> {
        Err(refused())
    }

    async fn setup(&mut self) -> tpch_graph::Result<()> {
        Ok(())
    }

    async fn drop_indexes(&mut self) -> tpch_graph::Result<()> {
        Ok(())
    }

    async fn create_index(&mut self, _index: &IndexSpec) -> tpch_graph::Result<()> {
        Ok(())
    }

    async fn write_nodes(&mut self, _label: Label, _nodes: &[Node]) -> tpch_graph::Result<()> {
        Ok(())
    }

    async fn write_edges(&mut self, _rel: RelType, _edges: &[Edge]) -> tpch_graph::Result<()> {
        Ok(())
    }

    async fn execute(&mut self, _query: &str) -> tpch_graph::Result<QueryOutput> {
        Err(refused())
    }

    async fn storage_info(&mut self) -> tpch_graph::Result<StorageInfo> {
        Ok(StorageInfo::default())
    }

    async fn close(&mut self) -> tpch_graph::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn load_args(skip_clear: bool, force: bool) -> LoadArgs {
    LoadArgs {
        backend: BackendKind::Nebula,
        batch_size: None,
        tables: Vec::new(),
        skip_clear,
        force,
        report: None,
    }
}

#[tokio::test]
async fn test_failed_load_still_closes_backend() {
    let dir = tempfile::tempdir().unwrap();
    let closed = Arc::new(AtomicBool::new(false));
    let db = Box::new(UnclearableBackend {
        closed: closed.clone(),
    });

    let err = load_then_close(db, &load_args(false, true), 100, dir.path(), &ProgressBar::hidden())
        .await
        .unwrap_err();

    assert!(closed.load(Ordering::SeqCst));
    let chain = format!("{err:#}");
    assert!(chain.contains("preparing NebulaGraph"), "{chain}");
    assert!(chain.contains("space is locked"), "{chain}");
}

#[test]
fn test_json_output_never_prompts() {
    let json = OutputContext {
        json: true,
        ..Default::default()
    };
    let err = needs_confirmation(&load_args(false, false), &json).unwrap_err();
    assert!(err.to_string().contains("--force"));

    assert!(!needs_confirmation(&load_args(false, true), &json).unwrap());
    assert!(!needs_confirmation(&load_args(true, false), &json).unwrap());
}

#[test]
fn test_terminal_output_asks_before_clearing() {
    let output = OutputContext::default();
    assert!(needs_confirmation(&load_args(false, false), &output).unwrap());
    assert!(!needs_confirmation(&load_args(false, true), &output).unwrap());
}
