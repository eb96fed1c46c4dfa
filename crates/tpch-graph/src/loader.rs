//! Bulk loader
//!
//! Streams each `.tbl` file in [`Table::LOAD_ORDER`], maps every batch of
//! rows onto the canonical graph and hands it to the backend: the batch's
//! nodes first, then its relationships. Loading in dependency order means
//! every relationship endpoint has been written by the time it is matched.

use chrono::Utc;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use crate::backend::GraphBackend;
use crate::dataset::{
    Customer, LineItem, Nation, Order, Part, PartSupp, Region, Supplier, Table, TableReader,
    TpchRow,
};
use crate::error::Result;
use crate::model::{Edge, GraphRecords, Label, Node, RelType, ToGraph};
use crate::report::{LoadReport, TableLoad};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Progress notifications emitted while loading
#[derive(Debug, Clone, Copy)]
pub enum LoadEvent<'a> {
    TableStarted(Table),
    /// `records` rows of `table` written so far
    BatchWritten { table: Table, records: usize },
    TableFinished(&'a TableLoad),
}

type ProgressFn<'a> = Box<dyn FnMut(LoadEvent<'_>) + Send + 'a>;

pub struct Loader<'a> {
    backend: &'a mut dyn GraphBackend,
    data_dir: PathBuf,
    batch_size: usize,
    tables: Vec<Table>,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> Loader<'a> {
    pub fn new(backend: &'a mut dyn GraphBackend, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            data_dir: data_dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            tables: Table::LOAD_ORDER.to_vec(),
            progress: None,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Restrict the load to `tables`; they are still loaded in
    /// dependency order
    pub fn tables(mut self, tables: &[Table]) -> Self {
        self.tables = Table::LOAD_ORDER
            .into_iter()
            .filter(|t| tables.contains(t))
            .collect();
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(LoadEvent<'_>) + Send + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    fn notify(&mut self, event: LoadEvent<'_>) {
        if let Some(f) = self.progress.as_mut() {
            f(event);
        }
    }

    /// Wipe the target and recreate its schema
    pub async fn prepare(&mut self) -> Result<()> {
        info!("clearing {}", self.backend.kind());
        self.backend.clear().await?;
        info!("creating schema on {}", self.backend.kind());
        self.backend.setup().await
    }

    pub async fn load(&mut self) -> Result<LoadReport> {
        let started_at = Utc::now();
        let started = Instant::now();
        let mut tables = Vec::with_capacity(self.tables.len());

        for table in self.tables.clone() {
            self.notify(LoadEvent::TableStarted(table));
            let loaded = match table {
                Table::Region => self.load_table::<Region>().await?,
                Table::Nation => self.load_table::<Nation>().await?,
                Table::Supplier => self.load_table::<Supplier>().await?,
                Table::Customer => self.load_table::<Customer>().await?,
                Table::Part => self.load_table::<Part>().await?,
                Table::PartSupp => self.load_table::<PartSupp>().await?,
                Table::Orders => self.load_table::<Order>().await?,
                Table::LineItem => self.load_table::<LineItem>().await?,
            };
            info!(
                "{}: loaded {} records in {} batches ({:.2}s)",
                table,
                loaded.records,
                loaded.batches,
                loaded.elapsed.as_secs_f64()
            );
            self.notify(LoadEvent::TableFinished(&loaded));
            tables.push(loaded);
        }

        Ok(LoadReport {
            backend: self.backend.kind(),
            started_at,
            batch_size: self.batch_size,
            tables,
            total: started.elapsed(),
        })
    }

    async fn load_table<R: TpchRow + ToGraph>(&mut self) -> Result<TableLoad> {
        let started = Instant::now();
        let mut stats = TableLoad::new(R::TABLE);
        let mut batch = Vec::with_capacity(self.batch_size);

        for row in TableReader::<R>::open(&self.data_dir)? {
            batch.push(row?);
            if batch.len() == self.batch_size {
                self.write_batch(&batch, &mut stats).await?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            self.write_batch(&batch, &mut stats).await?;
        }

        stats.elapsed = started.elapsed();
        Ok(stats)
    }

    async fn write_batch<R: TpchRow + ToGraph>(&mut self, rows: &[R], stats: &mut TableLoad) -> Result<()> {
        let mut records = GraphRecords::default();
        for row in rows {
            row.to_graph(&mut records);
        }

        for (label, nodes) in group_nodes(records.nodes) {
            self.backend.write_nodes(label, &nodes).await?;
            stats.nodes += nodes.len();
        }
        for (rel, edges) in group_edges(records.edges) {
            self.backend.write_edges(rel, &edges).await?;
            stats.edges += edges.len();
        }

        stats.records += rows.len();
        stats.batches += 1;
        debug!("{}: batch {} written", R::TABLE, stats.batches);
        self.notify(LoadEvent::BatchWritten {
            table: R::TABLE,
            records: stats.records,
        });
        Ok(())
    }
}

/// Group nodes by label, in order of first appearance
fn group_nodes(nodes: Vec<Node>) -> Vec<(Label, Vec<Node>)> {
    let mut groups: Vec<(Label, Vec<Node>)> = Vec::new();
    for node in nodes {
        match groups.iter_mut().find(|(l, _)| *l == node.label) {
            Some((_, group)) => group.push(node),
            None => groups.push((node.label, vec![node])),
        }
    }
    groups
}

/// Group edges by relationship type, in order of first appearance
fn group_edges(edges: Vec<Edge>) -> Vec<(RelType, Vec<Edge>)> {
    let mut groups: Vec<(RelType, Vec<Edge>)> = Vec::new();
    for edge in edges {
        match groups.iter_mut().find(|(r, _)| *r == edge.rel) {
            Some((_, group)) => group.push(edge),
            None => groups.push((edge.rel, vec![edge])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{Call, RecordingBackend};
    use crate::error::BenchError;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    fn write(dir: &Path, table: Table, content: &str) {
        std::fs::write(table.path(dir), content).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), Table::Region, "0|AFRICA|a|\n1|AMERICA|b|\n");
        write(
            dir.path(),
            Table::Nation,
            "0|ALGERIA|0|x|\n1|ARGENTINA|1|y|\n2|BRAZIL|1|z|\n",
        );
        write(
            dir.path(),
            Table::LineItem,
            "1|155190|7706|1|17|21168.23|0.04|0.02|N|O|1996-03-13|1996-02-12|1996-03-22|DELIVER IN PERSON|TRUCK|a|\n\
             1|67310|7311|2|36|45983.16|0.09|0.06|N|O|1996-04-12|1996-02-28|1996-04-20|TAKE BACK RETURN|MAIL|b|\n",
        );
        dir
    }

    #[tokio::test]
    async fn test_tables_load_in_dependency_order() {
        let dir = fixture();
        let mut backend = RecordingBackend::default();
        let report = Loader::new(&mut backend, dir.path())
            .tables(&[Table::Nation, Table::Region])
            .load()
            .await
            .unwrap();

        assert_eq!(
            report.tables.iter().map(|t| t.table).collect::<Vec<_>>(),
            [Table::Region, Table::Nation]
        );
        assert_eq!(
            backend.calls,
            [
                Call::Nodes(Label::Region, 2),
                Call::Nodes(Label::Nation, 3),
                Call::Edges(RelType::BelongsTo, 3),
            ]
        );
        assert_eq!(report.records(), 5);
        assert_eq!(report.nodes(), 5);
        assert_eq!(report.edges(), 3);
    }

    #[tokio::test]
    async fn test_batches_and_nodes_before_edges() {
        let dir = fixture();
        let mut backend = RecordingBackend::default();
        let report = Loader::new(&mut backend, dir.path())
            .tables(&[Table::Nation])
            .batch_size(2)
            .load()
            .await
            .unwrap();

        let nation = &report.tables[0];
        assert_eq!((nation.records, nation.batches), (3, 2));
        assert_eq!(
            backend.calls,
            [
                Call::Nodes(Label::Nation, 2),
                Call::Edges(RelType::BelongsTo, 2),
                Call::Nodes(Label::Nation, 1),
                Call::Edges(RelType::BelongsTo, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_lineitem_edges_grouped_by_type() {
        let dir = fixture();
        let mut backend = RecordingBackend::default();
        let report = Loader::new(&mut backend, dir.path())
            .tables(&[Table::LineItem])
            .load()
            .await
            .unwrap();

        assert_eq!(
            backend.calls,
            [
                Call::Nodes(Label::LineItem, 2),
                Call::Edges(RelType::Contains, 2),
                Call::Edges(RelType::OfPart, 2),
                Call::Edges(RelType::SuppliedBy, 2),
            ]
        );
        assert_eq!(report.tables[0].edges, 6);
    }

    #[tokio::test]
    async fn test_prepare_clears_then_sets_up() {
        let dir = fixture();
        let mut backend = RecordingBackend::default();
        Loader::new(&mut backend, dir.path()).prepare().await.unwrap();
        assert_eq!(backend.calls, [Call::Clear, Call::Setup]);
    }

    #[tokio::test]
    async fn test_missing_table_aborts() {
        let dir = fixture();
        let mut backend = RecordingBackend::default();
        let err = Loader::new(&mut backend, dir.path())
            .tables(&[Table::Region, Table::Supplier])
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::MissingTable(_)));
        assert_eq!(backend.calls, [Call::Nodes(Label::Region, 2)]);
    }

    #[tokio::test]
    async fn test_progress_events() {
        let dir = fixture();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut backend = RecordingBackend::default();
        Loader::new(&mut backend, dir.path())
            .tables(&[Table::Nation])
            .batch_size(2)
            .on_progress(move |event| {
                let line = match event {
                    LoadEvent::TableStarted(t) => format!("start {t}"),
                    LoadEvent::BatchWritten { records, .. } => format!("batch {records}"),
                    LoadEvent::TableFinished(t) => format!("done {}", t.records),
                };
                sink.lock().unwrap().push(line);
            })
            .load()
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            ["start nation", "batch 2", "batch 3", "done 3"]
        );
    }
}
