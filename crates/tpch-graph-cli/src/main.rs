use anyhow::Result;
use clap::Parser;

use tpch_graph_cli::{Cli, init_logging, run};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json)?;
    run(cli).await
}
