use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tpch_graph::StorageReport;
use tpch_graph::backend::BackendKind;

use super::{OutputContext, connect, create_spinner, parse_backend, write_report};
use crate::config::Config;

#[derive(Args)]
pub struct StorageArgs {
    /// Target database (neo4j, memgraph, arangodb, nebula)
    #[arg(value_parser = parse_backend)]
    pub backend: BackendKind,

    /// Also write the report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub async fn execute(args: StorageArgs, cfg: &Config, output: &OutputContext) -> Result<()> {
    let mut db = connect(args.backend, cfg, output).await?;

    let spinner = create_spinner(output, "Collecting storage figures...");
    let info = db.storage_info().await;
    spinner.finish_and_clear();
    let closed = db.close().await;
    let info = info.with_context(|| format!("reading storage figures from {}", args.backend))?;
    closed.with_context(|| format!("closing {}", args.backend))?;

    let report = StorageReport::new(args.backend, info);
    if let Some(path) = &args.report {
        write_report(path, &report)?;
    }

    if output.json {
        return output.print_json(&report);
    }

    println!("{}", render(&report, output));
    match report.info.bytes {
        Some(bytes) => output.print_info(&format!("Size: {}", format_bytes(bytes))),
        None => output.print_info(&format!("{} does not report a size", report.backend)),
    }
    if output.verbose {
        for (key, value) in &report.info.details {
            println!("  {key}: {value}");
        }
    }

    Ok(())
}

/// Counts per label and relationship type, with totals
pub fn render(report: &StorageReport, output: &OutputContext) -> String {
    let info = &report.info;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for (label, count) in &info.nodes {
        rows.push(vec!["node".into(), label.clone(), count.to_string()]);
    }
    for (rel, count) in &info.edges {
        rows.push(vec!["relationship".into(), rel.clone(), count.to_string()]);
    }
    rows.push(vec!["node".into(), "total".into(), info.total_nodes().to_string()]);
    rows.push(vec![
        "relationship".into(),
        "total".into(),
        info.total_edges().to_string(),
    ]);
    output.render_table(&["Kind", "Name", "Count"], rows)
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
