//! Query runner
//!
//! Drops secondary indexes once, then runs each query: its indexes are
//! created first (untimed), warm-up iterations are discarded, and the
//! timed iterations are summarised. A failing query is recorded in the
//! report and the suite carries on.

use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::backend::{GraphBackend, QueryOutput};
use crate::error::Result;
use crate::queries::{BenchQuery, Suite};
use crate::report::{millis, LatencySummary, QueryReport, QueryResult};

type ResultFn<'a> = Box<dyn FnMut(&QueryResult) + Send + 'a>;

pub struct QueryRunner<'a> {
    backend: &'a mut dyn GraphBackend,
    iterations: usize,
    warmup: usize,
    sample_rows: usize,
    on_result: Option<ResultFn<'a>>,
}

impl<'a> QueryRunner<'a> {
    pub fn new(backend: &'a mut dyn GraphBackend) -> Self {
        Self {
            backend,
            iterations: 1,
            warmup: 0,
            sample_rows: 0,
            on_result: None,
        }
    }

    /// Timed iterations per query (at least one)
    pub fn iterations(mut self, n: usize) -> Self {
        self.iterations = n.max(1);
        self
    }

    /// Untimed iterations run before the timed ones
    pub fn warmup(mut self, n: usize) -> Self {
        self.warmup = n;
        self
    }

    /// Keep the first `n` rows of each query in the report
    pub fn sample_rows(mut self, n: usize) -> Self {
        self.sample_rows = n;
        self
    }

    pub fn on_result(mut self, f: impl FnMut(&QueryResult) + Send + 'a) -> Self {
        self.on_result = Some(Box::new(f));
        self
    }

    pub async fn run(&mut self, suite: Suite) -> Result<QueryReport> {
        self.run_queries(suite.name(), &suite.queries()).await
    }

    pub async fn run_queries(&mut self, suite: &str, queries: &[&BenchQuery]) -> Result<QueryReport> {
        let started_at = Utc::now();
        info!("dropping secondary indexes on {}", self.backend.kind());
        self.backend.drop_indexes().await?;

        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let result = self.run_one(query).await;
            if let Some(f) = self.on_result.as_mut() {
                f(&result);
            }
            results.push(result);
        }

        Ok(QueryReport {
            backend: self.backend.kind(),
            suite: suite.to_string(),
            started_at,
            iterations: self.iterations,
            warmup: self.warmup,
            results,
        })
    }

    async fn run_one(&mut self, query: &BenchQuery) -> QueryResult {
        let mut result = QueryResult {
            id: query.id.to_string(),
            title: query.title.to_string(),
            indexed: query.is_indexed(),
            rows: 0,
            latency: None,
            error: None,
            sample: Vec::new(),
        };

        match self.measure(query).await {
            Ok((samples, output)) => {
                let latency = LatencySummary::from_samples(&samples);
                if let Some(l) = &latency {
                    info!(
                        "{} {}: {} rows, median {:.2}ms",
                        self.backend.kind(),
                        query.id,
                        output.len(),
                        millis::as_millis(l.median)
                    );
                }
                result.rows = output.len();
                result.latency = latency;
                result.sample = output.rows.into_iter().take(self.sample_rows).collect();
            }
            Err(e) => {
                warn!("{} {} failed: {}", self.backend.kind(), query.id, e);
                result.error = Some(e.to_string());
            }
        }
        result
    }

    async fn measure(&mut self, query: &BenchQuery) -> Result<(Vec<Duration>, QueryOutput)> {
        for index in query.needs {
            self.backend.create_index(index).await?;
        }

        let text = query.text(self.backend.kind());
        for _ in 0..self.warmup {
            self.backend.execute(text).await?;
        }

        let mut samples = Vec::with_capacity(self.iterations);
        let mut output = QueryOutput::default();
        for _ in 0..self.iterations {
            let started = Instant::now();
            output = self.backend.execute(text).await?;
            samples.push(started.elapsed());
        }
        Ok((samples, output))
    }
}
