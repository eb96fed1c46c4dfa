use anyhow::Result;
use clap::{Args, Subcommand};

use super::OutputContext;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a configuration file with the default settings
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
    /// Show configuration file path
    Path,
}

pub async fn execute(
    args: ConfigArgs,
    cfg: &Config,
    path: Option<&str>,
    output: &OutputContext,
) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(cfg, output),
        ConfigCommands::Init { force } => init_config(path, force, output),
        ConfigCommands::Path => show_path(path, output),
    }
}

fn show_config(cfg: &Config, output: &OutputContext) -> Result<()> {
    if output.json {
        return output.print_json(&masked(cfg));
    }
    print!("{}", toml::to_string_pretty(&masked(cfg))?);
    Ok(())
}

/// Copy of `cfg` with every password replaced
fn masked(cfg: &Config) -> Config {
    fn mask(password: &mut String) {
        if !password.is_empty() {
            *password = "********".to_string();
        }
    }

    let mut cfg = cfg.clone();
    mask(&mut cfg.backends.neo4j.password);
    mask(&mut cfg.backends.memgraph.password);
    mask(&mut cfg.backends.arangodb.password);
    mask(&mut cfg.backends.nebula.password);
    cfg
}

fn init_config(path: Option<&str>, force: bool, output: &OutputContext) -> Result<()> {
    let target = Config::resolve(path);

    if target.exists() && !force {
        output.print_error(&format!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            target.display()
        ));
        return Ok(());
    }

    Config::default().save(path)?;
    output.print_success(&format!("Configuration file created at {}", target.display()));

    Ok(())
}

fn show_path(path: Option<&str>, output: &OutputContext) -> Result<()> {
    let target = Config::resolve(path);
    println!("{}", target.display());
    if target.exists() {
        output.print_info("File exists");
    } else {
        output.print_info("File does not exist");
    }
    Ok(())
}
