//! Serialisable load, query and storage reports
//!
//! Durations are serialised as fractional milliseconds.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::backend::{BackendKind, StorageInfo};
use crate::dataset::Table;

/// Serialise a `Duration` as milliseconds
pub mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(as_millis(*d))
    }

    pub fn as_millis(d: Duration) -> f64 {
        d.as_nanos() as f64 / 1_000_000.0
    }
}

/// Outcome of loading one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableLoad {
    pub table: Table,
    /// Rows read from the `.tbl` file
    pub records: usize,
    pub nodes: usize,
    pub edges: usize,
    pub batches: usize,
    #[serde(with = "millis")]
    pub elapsed: Duration,
}

impl TableLoad {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            records: 0,
            nodes: 0,
            edges: 0,
            batches: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Records written per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.records as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub backend: BackendKind,
    pub started_at: DateTime<Utc>,
    pub batch_size: usize,
    pub tables: Vec<TableLoad>,
    #[serde(with = "millis")]
    pub total: Duration,
}

impl LoadReport {
    pub fn records(&self) -> usize {
        self.tables.iter().map(|t| t.records).sum()
    }

    pub fn nodes(&self) -> usize {
        self.tables.iter().map(|t| t.nodes).sum()
    }

    pub fn edges(&self) -> usize {
        self.tables.iter().map(|t| t.edges).sum()
    }
}

/// Latency statistics over the timed iterations of one query
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    pub iterations: usize,
    #[serde(with = "millis")]
    pub min: Duration,
    #[serde(with = "millis")]
    pub mean: Duration,
    #[serde(with = "millis")]
    pub median: Duration,
    #[serde(with = "millis")]
    pub p95: Duration,
    #[serde(with = "millis")]
    pub max: Duration,
}

impl LatencySummary {
    /// Summarise `samples`; `None` when there are none
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort();
        let n = sorted.len();
        let total: Duration = sorted.iter().sum();
        Some(Self {
            iterations: n,
            min: sorted[0],
            mean: total / n as u32,
            median: sorted[n / 2],
            p95: sorted[((n * 95) / 100).min(n - 1)],
            max: sorted[n - 1],
        })
    }
}

/// Outcome of one benchmark query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub id: String,
    pub title: String,
    pub indexed: bool,
    /// Rows returned by the last timed iteration
    pub rows: usize,
    pub latency: Option<LatencySummary>,
    pub error: Option<String>,
    /// First rows of the last timed iteration
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sample: Vec<Value>,
}

impl QueryResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub backend: BackendKind,
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub iterations: usize,
    pub warmup: usize,
    pub results: Vec<QueryResult>,
}

impl QueryReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.is_ok()).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageReport {
    pub backend: BackendKind,
    pub collected_at: DateTime<Utc>,
    #[serde(flatten)]
    pub info: StorageInfo,
}

impl StorageReport {
    pub fn new(backend: BackendKind, info: StorageInfo) -> Self {
        Self {
            backend,
            collected_at: Utc::now(),
            info,
        }
    }
}
