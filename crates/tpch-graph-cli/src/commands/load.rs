use anyhow::{Context, Result};
use clap::Args;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tpch_graph::backend::BackendKind;
use tpch_graph::dataset::Table;
use tpch_graph::{GraphBackend, LoadEvent, LoadReport, Loader};
use tracing::{debug, info};

use super::{
    OutputContext, connect, create_spinner, ensure_release_build, parse_backend, parse_table,
    write_report,
};
use crate::config::Config;

#[derive(Args)]
pub struct LoadArgs {
    /// Target database (neo4j, memgraph, arangodb, nebula)
    #[arg(value_parser = parse_backend)]
    pub backend: BackendKind,

    /// Records per write batch (defaults to the config file value)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Load only these tables (comma separated); dependency order is kept
    #[arg(long, value_delimiter = ',', value_parser = parse_table)]
    pub tables: Vec<Table>,

    /// Append to the existing data instead of clearing it first
    #[arg(long)]
    pub skip_clear: bool,

    /// Do not ask for confirmation before clearing (required with --json)
    #[arg(short, long)]
    pub force: bool,

    /// Also write the report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub async fn execute(args: LoadArgs, cfg: &Config, data_dir: &Path, output: &OutputContext) -> Result<()> {
    ensure_release_build()?;

    if !data_dir.is_dir() {
        anyhow::bail!("data directory {} does not exist", data_dir.display());
    }

    if needs_confirmation(&args, output)? {
        use dialoguer::Confirm;
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "This deletes all data in {}. Continue?",
                args.backend
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            output.print_info("Load cancelled");
            return Ok(());
        }
    }

    let db = connect(args.backend, cfg, output).await?;
    let batch_size = args.batch_size.unwrap_or(cfg.batch_size);

    let spinner = create_spinner(output, "Preparing...");
    let result = load_then_close(db, &args, batch_size, data_dir, &spinner).await;
    spinner.finish_and_clear();
    let report = result?;

    if let Some(path) = &args.report {
        write_report(path, &report)?;
    }

    if output.json {
        output.print_json(&report)?;
    } else {
        println!("{}", render(&report, output));
        output.print_success(&format!(
            "Loaded {} records ({} nodes, {} relationships) into {} in {:.2}s",
            report.records(),
            report.nodes(),
            report.edges(),
            report.backend,
            report.total.as_secs_f64()
        ));
        if let Some(path) = &args.report {
            output.print_info(&format!("Report written to {}", path.display()));
        }
    }

    Ok(())
}

/// Whether to ask before clearing. JSON output never prompts, so clearing
/// there needs `--force`.
pub fn needs_confirmation(args: &LoadArgs, output: &OutputContext) -> Result<bool> {
    if args.skip_clear || args.force {
        return Ok(false);
    }
    if output.json {
        anyhow::bail!(
            "refusing to clear {} without confirmation; pass --force (or --skip-clear) with --json",
            args.backend
        );
    }
    Ok(true)
}

/// Loads into `db` and closes it, whether or not the load succeeded
pub async fn load_then_close(
    mut db: Box<dyn GraphBackend>,
    args: &LoadArgs,
    batch_size: usize,
    data_dir: &Path,
    spinner: &ProgressBar,
) -> Result<LoadReport> {
    let result = load_into(db.as_mut(), args, batch_size, data_dir, spinner).await;
    let closed = db.close().await;
    let report = result?;
    closed.with_context(|| format!("closing {}", args.backend))?;
    Ok(report)
}

async fn load_into(
    db: &mut dyn GraphBackend,
    args: &LoadArgs,
    batch_size: usize,
    data_dir: &Path,
    spinner: &ProgressBar,
) -> Result<LoadReport> {
    let progress = spinner.clone();
    let mut loader = Loader::new(db, data_dir)
        .batch_size(batch_size)
        .on_progress(move |event| match event {
            LoadEvent::TableStarted(table) => progress.set_message(format!("{table}: starting")),
            LoadEvent::BatchWritten { table, records } => {
                progress.set_message(format!("{table}: {records} records"))
            }
            LoadEvent::TableFinished(done) => progress.println(format!(
                "  {} {} records in {:.2}s",
                done.table,
                done.records,
                done.elapsed.as_secs_f64()
            )),
        });
    if !args.tables.is_empty() {
        loader = loader.tables(&args.tables);
    }

    if !args.skip_clear {
        spinner.set_message(format!("Clearing {}...", args.backend));
        debug!("clearing {} before loading", args.backend);
        loader
            .prepare()
            .await
            .with_context(|| format!("preparing {}", args.backend))?;
    }

    let report = loader
        .load()
        .await
        .with_context(|| format!("loading {}", args.backend))?;
    info!(
        "loaded {} records into {} in {:.2}s",
        report.records(),
        args.backend,
        report.total.as_secs_f64()
    );
    Ok(report)
}

/// Per-table load figures
pub fn render(report: &LoadReport, output: &OutputContext) -> String {
    let mut rows: Vec<Vec<String>> = report
        .tables
        .iter()
        .map(|t| {
            vec![
                t.table.to_string(),
                t.records.to_string(),
                t.nodes.to_string(),
                t.edges.to_string(),
                t.batches.to_string(),
                format!("{:.2}", t.elapsed.as_secs_f64()),
                format!("{:.0}", t.throughput()),
            ]
        })
        .collect();
    rows.push(vec![
        "total".to_string(),
        report.records().to_string(),
        report.nodes().to_string(),
        report.edges().to_string(),
        report.tables.iter().map(|t| t.batches).sum::<usize>().to_string(),
        format!("{:.2}", report.total.as_secs_f64()),
        String::new(),
    ]);

    output.render_table(
        &["Table", "Records", "Nodes", "Edges", "Batches", "Seconds", "Records/s"],
        rows,
    )
}
