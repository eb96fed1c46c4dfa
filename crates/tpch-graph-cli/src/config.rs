use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tpch_graph::backend::BackendsConfig;
use tpch_graph::loader::DEFAULT_BATCH_SIZE;

/// Directory holding the `.tbl` files when neither the flag nor the
/// config file names one
pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory containing the dbgen `.tbl` files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Records per write batch
    pub batch_size: usize,
    /// Connection settings, one section per database
    pub backends: BackendsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            batch_size: DEFAULT_BATCH_SIZE,
            backends: BackendsConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = Self::resolve(path);

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: Option<&str>) -> Result<()> {
        let config_path = Self::resolve(path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)
            .with_context(|| format!("writing {}", config_path.display()))?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tpch-graph")
            .join("config.toml")
    }

    pub fn resolve(path: Option<&str>) -> PathBuf {
        match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_path(),
        }
    }

    /// The `--data-dir` flag wins over the config file
    pub fn data_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let cfg = Config::load(path.to_str()).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_data_dir_precedence() {
        let mut cfg = Config::default();
        assert_eq!(cfg.data_dir(None), PathBuf::from(DEFAULT_DATA_DIR));

        cfg.data_dir = Some(PathBuf::from("/srv/tpch/sf1"));
        assert_eq!(cfg.data_dir(None), PathBuf::from("/srv/tpch/sf1"));
        assert_eq!(
            cfg.data_dir(Some(Path::new("/tmp/sf10"))),
            PathBuf::from("/tmp/sf10")
        );
    }
}
