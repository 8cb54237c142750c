//! Application configuration.
//!
//! Settings come from a TOML file (`sfp.toml`) with defaults for every field,
//! then from environment variables (`HOST`, `PORT`, `SFP_PRELOAD_DIR`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::algorithms::{IsolationForestParams, PolicyParams};
use crate::preprocessing::TmFill;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SFP_CONFIG";
pub const CONFIG_FILE_NAME: &str = "sfp.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request body limit in megabytes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    /// Directory of CSV files ingested at start-up.
    #[serde(default)]
    pub preload_dir: Option<PathBuf>,
}

/// Defaults applied when a request leaves a pipeline parameter out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    /// Records returned in the visualize sample
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    #[serde(default = "default_iqr_factor")]
    pub iqr_factor: f64,
    #[serde(default = "default_zscore_threshold")]
    pub zscore_threshold: f64,
    #[serde(default = "default_contamination")]
    pub isolation_contamination: f64,
    #[serde(default = "default_isolation_trees")]
    pub isolation_trees: usize,
    #[serde(default = "default_isolation_max_samples")]
    pub isolation_max_samples: usize,
    #[serde(default = "default_isolation_seed")]
    pub isolation_seed: u64,
    #[serde(default)]
    pub tm_fill: TmFill,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            histogram_bins: default_histogram_bins(),
            sample_rows: default_sample_rows(),
            iqr_factor: default_iqr_factor(),
            zscore_threshold: default_zscore_threshold(),
            isolation_contamination: default_contamination(),
            isolation_trees: default_isolation_trees(),
            isolation_max_samples: default_isolation_max_samples(),
            isolation_seed: default_isolation_seed(),
            tm_fill: TmFill::default(),
        }
    }
}

impl PipelineSettings {
    /// Outlier parameters with the configured defaults.
    pub fn policy_params(&self) -> PolicyParams {
        PolicyParams {
            iqr_factor: self.iqr_factor,
            zscore_threshold: self.zscore_threshold,
            isolation: IsolationForestParams {
                contamination: self.isolation_contamination,
                seed: self.isolation_seed,
                n_trees: self.isolation_trees,
                max_samples: self.isolation_max_samples,
            },
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_mb() -> usize {
    50
}

fn default_histogram_bins() -> usize {
    15
}

fn default_sample_rows() -> usize {
    20
}

fn default_iqr_factor() -> f64 {
    1.5
}

fn default_zscore_threshold() -> f64 {
    3.0
}

fn default_contamination() -> f64 {
    0.05
}

fn default_isolation_trees() -> usize {
    100
}

fn default_isolation_max_samples() -> usize {
    256
}

fn default_isolation_seed() -> u64 {
    42
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from `SFP_CONFIG` or the default locations.
    ///
    /// Searches for `sfp.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// Defaults apply when no file exists. Environment overrides are applied
    /// in every case.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::search_paths()
                .into_iter()
                .find(|p| p.exists())
                .map(Self::from_file)
                .transpose()?
                .unwrap_or_default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn search_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ]
    }

    /// Apply `HOST`, `PORT` and `SFP_PRELOAD_DIR` overrides from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid PORT value '{}'", port))?;
        }
        if let Some(dir) = lookup("SFP_PRELOAD_DIR") {
            self.repository.preload_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.pipeline.histogram_bins, 15);
        assert_eq!(config.pipeline.isolation_seed, 42);
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
[server]
port = 9000

[pipeline]
iqr_factor = 3.0
tm_fill = "daily_mean"
"#;
        let config = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.pipeline.iqr_factor, 3.0);
        assert_eq!(config.pipeline.tm_fill, TmFill::DailyMean);
        assert_eq!(config.pipeline.policy_params().iqr_factor, 3.0);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[repository]\npreload_dir = \"/data/sites\"").unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.repository.preload_dir,
            Some(PathBuf::from("/data/sites"))
        );
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(AppConfig::from_toml_str("[server\nport = 1").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("PORT", "3000"), ("HOST", "127.0.0.1")].into();
        let mut config = AppConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");

        let bad: HashMap<&str, &str> = [("PORT", "eighty")].into();
        assert!(config
            .apply_env(|k| bad.get(k).map(|v| v.to_string()))
            .is_err());
    }

    #[test]
    fn test_body_limit_bytes() {
        let settings = ServerSettings::default();
        assert_eq!(settings.body_limit_bytes(), 50 * 1024 * 1024);
    }
}
