pub mod config;
pub mod load;
pub mod query;
pub mod storage;

use anyhow::{Context, Result, bail};
use comfy_table::{
    Table,
    presets::{ASCII_MARKDOWN, UTF8_FULL},
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tpch_graph::backend::{self, BackendKind, GraphBackend};
use tpch_graph::dataset::Table as TpchTable;
use tpch_graph::{BenchError, Suite};
use tracing::{debug, info};

use crate::config::Config;

/// Set to `1` to benchmark with an unoptimised build
pub const ALLOW_DEBUG_ENV: &str = "TPCH_GRAPH_ALLOW_DEBUG";

#[derive(Debug, Clone, Default)]
pub struct OutputContext {
    pub json: bool,
    pub markdown: bool,
    pub verbose: bool,
}

/// Creates a spinner with the given message, hidden in JSON mode
pub fn create_spinner(output: &OutputContext, message: &str) -> ProgressBar {
    if output.json {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Creates a progress bar with the given length, hidden in JSON mode
pub fn create_progress_bar(output: &OutputContext, len: u64, message: &str) -> ProgressBar {
    if output.json {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░"),
    );
    pb.set_message(message.to_string());
    pb
}

impl OutputContext {
    /// Render rows as a terminal table, or as Markdown with `--markdown`
    pub fn render_table(&self, header: &[&str], rows: Vec<Vec<String>>) -> String {
        let mut table = Table::new();
        table.load_preset(if self.markdown { ASCII_MARKDOWN } else { UTF8_FULL });
        table.set_header(header);
        for row in rows {
            table.add_row(row);
        }
        table.to_string()
    }

    pub fn print_json<T: Serialize>(&self, data: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(data)?);
        Ok(())
    }

    pub fn print_success(&self, message: &str) {
        use colored::Colorize;
        if !self.json {
            println!("{} {}", "✓".green(), message);
        }
    }

    pub fn print_error(&self, message: &str) {
        use colored::Colorize;
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn print_info(&self, message: &str) {
        use colored::Colorize;
        if !self.json {
            println!("{} {}", "ℹ".blue(), message);
        }
    }
}

/// Write `report` as pretty JSON to `path`
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(report)?;
    fs::write(path, content).with_context(|| format!("writing report to {}", path.display()))?;
    info!("report written to {}", path.display());
    Ok(())
}

/// Refuse to benchmark with a debug build unless explicitly allowed
pub fn ensure_release_build() -> Result<()> {
    if cfg!(debug_assertions) && std::env::var(ALLOW_DEBUG_ENV).as_deref() != Ok("1") {
        bail!(
            "refusing to benchmark with a debug build; build with --release or set {}=1",
            ALLOW_DEBUG_ENV
        );
    }
    Ok(())
}

pub async fn connect(kind: BackendKind, cfg: &Config, output: &OutputContext) -> Result<Box<dyn GraphBackend>> {
    let spinner = create_spinner(output, &format!("Connecting to {kind}..."));
    debug!("connecting to {}", kind);
    let result = backend::connect(kind, &cfg.backends).await;
    spinner.finish_and_clear();
    result.with_context(|| format!("connecting to {kind}"))
}

pub fn parse_backend(s: &str) -> std::result::Result<BackendKind, String> {
    s.parse().map_err(|e: BenchError| e.to_string())
}

pub fn parse_table(s: &str) -> std::result::Result<TpchTable, String> {
    s.parse().map_err(|e: BenchError| e.to_string())
}

pub fn parse_suite(s: &str) -> std::result::Result<Suite, String> {
    s.parse().map_err(|e: BenchError| e.to_string())
}

/// Milliseconds with two decimals
pub fn format_ms(d: Duration) -> String {
    format!("{:.2}", d.as_secs_f64() * 1000.0)
}

pub fn value_to_string(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(value_to_string).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}
