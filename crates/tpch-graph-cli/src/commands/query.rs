use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tpch_graph::backend::BackendKind;
use tpch_graph::queries::find;
use tpch_graph::{QueryReport, QueryRunner, Suite};

use super::{
    OutputContext, connect, create_progress_bar, ensure_release_build, format_ms, parse_backend,
    parse_suite, value_to_string, write_report,
};
use crate::config::Config;

/// Rows kept per query for `--show-rows`
const SHOWN_ROWS: usize = 10;

#[derive(Args)]
pub struct QueryArgs {
    /// Target database (neo4j, memgraph, arangodb, nebula)
    #[arg(value_parser = parse_backend)]
    pub backend: BackendKind,

    /// Query suite: core, extended or all
    #[arg(long, default_value = "core", value_parser = parse_suite)]
    pub suite: Suite,

    /// Timed iterations per query
    #[arg(short, long, default_value_t = 5)]
    pub iterations: usize,

    /// Untimed iterations before timing starts
    #[arg(short, long, default_value_t = 1)]
    pub warmup: usize,

    /// Run only these queries (comma separated ids, e.g. A1,B2)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Print the first rows returned by each query
    #[arg(long)]
    pub show_rows: bool,

    /// Also write the report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub async fn execute(args: QueryArgs, cfg: &Config, output: &OutputContext) -> Result<()> {
    ensure_release_build()?;

    let (suite_name, queries) = if args.only.is_empty() {
        (args.suite.name(), args.suite.queries())
    } else {
        ("custom", find(&args.only)?)
    };

    let mut db = connect(args.backend, cfg, output).await?;

    let pb = create_progress_bar(
        output,
        queries.len() as u64,
        &format!("Running {} queries on {}", suite_name, args.backend),
    );
    let progress = pb.clone();
    let result = QueryRunner::new(db.as_mut())
        .iterations(args.iterations)
        .warmup(args.warmup)
        .sample_rows(if args.show_rows { SHOWN_ROWS } else { 0 })
        .on_result(move |r| {
            progress.set_message(format!("{} done", r.id));
            progress.inc(1);
        })
        .run_queries(suite_name, &queries)
        .await;
    pb.finish_and_clear();
    let closed = db.close().await;
    let report = result.with_context(|| format!("running queries on {}", args.backend))?;
    closed.with_context(|| format!("closing {}", args.backend))?;

    if let Some(path) = &args.report {
        write_report(path, &report)?;
    }

    if output.json {
        return output.print_json(&report);
    }

    println!("{}", render(&report, output));
    if args.show_rows {
        for result in report.results.iter().filter(|r| !r.sample.is_empty()) {
            println!();
            println!("{}: {} ({} rows)", result.id, result.title, result.rows);
            println!("{}", render_sample(&result.sample, output));
        }
    }

    match report.failures() {
        0 => output.print_success(&format!(
            "{} queries on {} ({} iterations, {} warm-up)",
            report.results.len(),
            report.backend,
            report.iterations,
            report.warmup
        )),
        n => output.print_error(&format!("{n} of {} queries failed", report.results.len())),
    }
    if let Some(path) = &args.report {
        output.print_info(&format!("Report written to {}", path.display()));
    }

    Ok(())
}

/// One line per query with its latency summary in milliseconds
pub fn render(report: &QueryReport, output: &OutputContext) -> String {
    let rows = report
        .results
        .iter()
        .map(|r| {
            let mut row = vec![
                r.id.clone(),
                r.title.clone(),
                if r.indexed { "yes" } else { "no" }.to_string(),
            ];
            match (&r.latency, &r.error) {
                (_, Some(error)) => {
                    row.push("-".to_string());
                    row.extend(std::iter::repeat_n(String::new(), 4));
                    row.push(error.clone());
                }
                (Some(l), None) => {
                    row.push(r.rows.to_string());
                    row.extend([l.min, l.median, l.p95, l.max].map(format_ms));
                    row.push(String::new());
                }
                (None, None) => {
                    row.push(r.rows.to_string());
                    row.extend(std::iter::repeat_n(String::new(), 5));
                }
            }
            row
        })
        .collect();

    output.render_table(
        &[
            "Query", "Title", "Indexed", "Rows", "Min ms", "Median ms", "P95 ms", "Max ms", "Error",
        ],
        rows,
    )
}

fn render_sample(sample: &[serde_json::Value], output: &OutputContext) -> String {
    let columns: Vec<String> = match sample.first() {
        Some(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
        _ => vec!["value".to_string()],
    };
    let rows = sample
        .iter()
        .map(|row| match row {
            serde_json::Value::Object(map) => columns
                .iter()
                .map(|c| map.get(c).map(value_to_string).unwrap_or_default())
                .collect(),
            other => vec![value_to_string(other)],
        })
        .collect();
    let header: Vec<&str> = columns.iter().map(String::as_str).collect();
    output.render_table(&header, rows)
}
