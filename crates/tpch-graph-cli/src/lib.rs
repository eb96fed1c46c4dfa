//! Command-line driver for the TPC-H graph benchmark
//!
//! The binary is a thin wrapper around [`run`]; argument types, config
//! handling and report rendering live here so they can be tested.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub mod commands;
pub mod config;

use commands::{config as config_cmd, load, query, storage};

/// Load TPC-H into graph databases and benchmark queries against them
#[derive(Parser)]
#[command(name = "tpch-graph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, env = "TPCH_GRAPH_CONFIG", global = true)]
    pub config: Option<String>,

    /// Directory containing the dbgen `.tbl` files
    #[arg(long, env = "TPCH_GRAPH_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long, global = true, conflicts_with = "markdown")]
    pub json: bool,

    /// Render tables as Markdown
    #[arg(long, global = true)]
    pub markdown: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clear a database and bulk-load the TPC-H tables into it
    Load(load::LoadArgs),
    /// Run a query suite and report latencies
    Query(query::QueryArgs),
    /// Report node, relationship and storage figures
    Storage(storage::StorageArgs),
    /// Configuration management
    Config(config_cmd::ConfigArgs),
    /// Generate shell completion scripts
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Installs the stderr log subscriber; `--json` switches it to JSON lines
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("tpch_graph={level},tpch_graph_cli={level}").into());

    // stdout carries reports
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(layer.json()).try_init()?;
    } else {
        registry.with(layer).try_init()?;
    }
    Ok(())
}

pub async fn run(cli: Cli) -> Result<()> {
    let cfg = config::Config::load(cli.config.as_deref())?;

    let output = commands::OutputContext {
        json: cli.json,
        markdown: cli.markdown,
        verbose: cli.verbose,
    };
    let data_dir = cfg.data_dir(cli.data_dir.as_deref());

    match cli.command {
        Commands::Load(args) => load::execute(args, &cfg, &data_dir, &output).await,
        Commands::Query(args) => query::execute(args, &cfg, &output).await,
        Commands::Storage(args) => storage::execute(args, &cfg, &output).await,
        Commands::Config(args) => {
            config_cmd::execute(args, &cfg, cli.config.as_deref(), &output).await
        }
        Commands::Completion { shell } => write_completion(shell, &mut std::io::stdout()),
    }
}

/// Completion script for `shell`, named after the binary
pub fn write_completion(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
    Ok(())
}
