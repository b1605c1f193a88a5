//! Configuration for the resolver and the CLI.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PIPESTATE_NON_RELOADABLE, PIPESTATE_DUPLICATES,
//!    PIPESTATE_METRICS)
//! 2. Project config file (.pipestate/config.yaml)
//! 3. User config file (<config dir>/pipestate/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .pipestate/config.yaml
//! - Falls back to the platform config directory

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{
    DuplicatePolicy, InMemoryMetrics, MetricsSink, NoopMetrics, NonReloadablePolicy, ResolverOptions, TracingMetrics,
};

pub const ENV_NON_RELOADABLE: &str = "PIPESTATE_NON_RELOADABLE";
pub const ENV_DUPLICATES: &str = "PIPESTATE_DUPLICATES";
pub const ENV_METRICS: &str = "PIPESTATE_METRICS";

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub resolver: ResolverOptions,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub sink: MetricsKind,
}

/// Which metrics sink to wire into the resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsKind {
    #[default]
    Noop,
    Tracing,
    Memory,
}

impl std::fmt::Display for MetricsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsKind::Noop => write!(f, "noop"),
            MetricsKind::Tracing => write!(f, "tracing"),
            MetricsKind::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for MetricsKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "noop" | "none" => Ok(MetricsKind::Noop),
            "tracing" | "log" => Ok(MetricsKind::Tracing),
            "memory" => Ok(MetricsKind::Memory),
            _ => anyhow::bail!("Unknown metrics sink: {}", s),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    /// Resolver policies
    pub options: ResolverOptions,
    /// Metrics sink selection
    pub metrics: MetricsKind,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Build the configured metrics sink.
    ///
    /// The in-memory sink is also returned concretely so callers can read
    /// its counters back.
    pub fn metrics_sink(&self) -> (Arc<dyn MetricsSink>, Option<Arc<InMemoryMetrics>>) {
        match self.metrics {
            MetricsKind::Noop => (Arc::new(NoopMetrics) as Arc<dyn MetricsSink>, None),
            MetricsKind::Tracing => (Arc::new(TracingMetrics) as Arc<dyn MetricsSink>, None),
            MetricsKind::Memory => {
                let memory = Arc::new(InMemoryMetrics::new());
                let sink: Arc<dyn MetricsSink> = memory.clone();
                (sink, Some(memory))
            }
        }
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".pipestate").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::config_dir()?.join("pipestate").join("config.yaml");
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Overlay environment variables read through `lookup`
fn apply_env(config: &mut ResolvedConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(value) = lookup(ENV_NON_RELOADABLE) {
        config.options.non_reloadable = value
            .parse::<NonReloadablePolicy>()
            .with_context(|| format!("Invalid {}", ENV_NON_RELOADABLE))?;
    }

    if let Some(value) = lookup(ENV_DUPLICATES) {
        config.options.duplicates = value
            .parse::<DuplicatePolicy>()
            .with_context(|| format!("Invalid {}", ENV_DUPLICATES))?;
    }

    if let Some(value) = lookup(ENV_METRICS) {
        config.metrics = value
            .parse::<MetricsKind>()
            .with_context(|| format!("Invalid {}", ENV_METRICS))?;
    }

    Ok(())
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config_file = find_config_file(&cwd);

    let mut config = if let Some(ref path) = config_file {
        let file = load_config_file(path)?;
        ResolvedConfig {
            options: file.resolver,
            metrics: file.metrics.sink,
            config_file: config_file.clone(),
        }
    } else {
        ResolvedConfig::default()
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;

    Ok(config)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".pipestate");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
resolver:
  non_reloadable: skip
  duplicates: reject
metrics:
  sink: memory
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version.as_deref(), Some("1.0"));
        assert_eq!(config.resolver.non_reloadable, NonReloadablePolicy::Skip);
        assert_eq!(config.resolver.duplicates, DuplicatePolicy::Reject);
        assert_eq!(config.metrics.sink, MetricsKind::Memory);
    }

    #[test]
    fn test_config_file_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "version: \"1.0\"\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.resolver, ResolverOptions::default());
        assert_eq!(config.metrics.sink, MetricsKind::Noop);
    }

    #[test]
    fn test_config_file_without_version() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "resolver:\n  non_reloadable: skip\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.version, None);
        assert_eq!(config.resolver.non_reloadable, NonReloadablePolicy::Skip);
    }

    #[test]
    fn test_config_file_found_from_nested_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".pipestate");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "metrics:\n  sink: tracing\n").unwrap();

        let nested = temp.path().join("pipelines").join("main");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.join("config.yaml"));
        assert_eq!(load_config_file(&found).unwrap().metrics.sink, MetricsKind::Tracing);
    }

    #[test]
    fn test_invalid_config_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "resolver: [not, a, map]\n").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = ResolvedConfig::default();
        let env: HashMap<&str, &str> = [(ENV_NON_RELOADABLE, "skip"), (ENV_METRICS, "tracing")]
            .into_iter()
            .collect();

        apply_env(&mut config, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.options.non_reloadable, NonReloadablePolicy::Skip);
        assert_eq!(config.options.duplicates, DuplicatePolicy::LastWriteWins);
        assert_eq!(config.metrics, MetricsKind::Tracing);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = ResolvedConfig::default();
        let err = apply_env(&mut config, |key| (key == ENV_DUPLICATES).then(|| "sometimes".to_string())).unwrap_err();
        assert!(err.to_string().contains(ENV_DUPLICATES));
    }

    #[test]
    fn test_memory_sink_is_shared() {
        let config = ResolvedConfig {
            metrics: MetricsKind::Memory,
            ..Default::default()
        };
        let (sink, memory) = config.metrics_sink();
        let memory = memory.unwrap();

        sink.report(crate::domain::ActionKind::Stop, 2).unwrap();
        assert_eq!(memory.snapshot().count(crate::domain::ActionKind::Stop), 2);
    }
}
