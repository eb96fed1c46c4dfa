//! TPC-H graph benchmark
//!
//! Loads the TPC-H dataset into graph databases as a property graph and
//! times a fixed set of queries against each of them.
//!
//! # Example
//!
//! ```no_run
//! use tpch_graph::backend::{self, BackendKind, BackendsConfig};
//! use tpch_graph::{Loader, QueryRunner, Suite};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BackendsConfig::default();
//!     let mut db = backend::connect(BackendKind::Neo4j, &config).await?;
//!
//!     let load = {
//!         let mut loader = Loader::new(db.as_mut(), "./data/sf1").batch_size(5000);
//!         loader.prepare().await?;
//!         loader.load().await?
//!     };
//!     println!("loaded {} records", load.records());
//!
//!     let report = QueryRunner::new(db.as_mut()).iterations(5).run(Suite::Core).await?;
//!     for result in &report.results {
//!         println!("{}: {:?}", result.id, result.latency);
//!     }
//!     db.close().await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod model;
pub mod queries;
pub mod report;
pub mod runner;
pub mod schema;

pub use backend::{BackendKind, GraphBackend};
pub use error::{BenchError, Result};
pub use loader::{LoadEvent, Loader};
pub use queries::{BenchQuery, Suite};
pub use report::{LoadReport, QueryReport, StorageReport};
pub use runner::QueryRunner;
