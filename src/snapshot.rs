//! YAML snapshots of both resolver inputs.
//!
//! A snapshot file lists the running pipelines and the desired ones, which
//! lets a plan be computed offline:
//!
//! ```yaml
//! running:
//!   - id: main
//!     fingerprint: "2cf24dba..."
//! desired:
//!   - id: main
//!     config: "input { generator {} }"
//!   - id: audit
//!     path: pipelines/audit/*.conf
//!     reloadable: false
//! ```
//!
//! Each entry carries exactly one of `fingerprint`, `config` or `path`.
//! Relative `path` patterns are resolved against the snapshot's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{Fingerprint, PipelineConfig, PipelineId, RunningPipelineView, RunningPipelines};
use crate::source::LocalSource;

/// Raw snapshot schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub running: Vec<PipelineEntry>,
    #[serde(default)]
    pub desired: Vec<PipelineEntry>,
}

/// One pipeline in a snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineEntry {
    pub id: String,

    /// Precomputed fingerprint
    pub fingerprint: Option<String>,

    /// Inline configuration text
    pub config: Option<String>,

    /// Glob of configuration fragment files
    pub path: Option<String>,

    #[serde(default = "default_reloadable")]
    pub reloadable: bool,
}

fn default_reloadable() -> bool {
    true
}

impl PipelineEntry {
    /// Compute this entry's fingerprint, reading files for `path` entries
    pub fn fingerprint(&self, base_dir: &Path) -> Result<Fingerprint> {
        match (&self.fingerprint, &self.config, &self.path) {
            (Some(fp), None, None) => Ok(Fingerprint::new(fp.clone())),
            (None, Some(text), None) => Ok(Fingerprint::of(text)),
            (None, None, Some(pattern)) => {
                let pattern = resolve_pattern(base_dir, pattern);
                LocalSource::new(pattern)
                    .fingerprint()
                    .with_context(|| format!("Failed to fingerprint pipeline '{}'", self.id))
            }
            (None, None, None) => anyhow::bail!(
                "Pipeline '{}' needs one of fingerprint, config or path",
                self.id
            ),
            _ => anyhow::bail!(
                "Pipeline '{}' sets more than one of fingerprint, config or path",
                self.id
            ),
        }
    }

    pub fn to_config(&self, base_dir: &Path) -> Result<PipelineConfig> {
        Ok(PipelineConfig::new(
            self.id.as_str(),
            self.fingerprint(base_dir)?,
            self.reloadable,
        ))
    }
}

/// Resolved resolver inputs
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub running: RunningPipelines,
    pub desired: Vec<PipelineConfig>,
}

impl Snapshot {
    /// Load a snapshot from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;

        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::from_yaml(&content, base_dir)
            .with_context(|| format!("Failed to load snapshot file: {}", path.display()))
    }

    /// Parse a snapshot from YAML content, resolving relative paths against `base_dir`
    pub fn from_yaml(content: &str, base_dir: &Path) -> Result<Self> {
        let file: SnapshotFile = serde_yaml::from_str(content).context("Failed to parse snapshot YAML")?;
        Self::resolve(&file, base_dir)
    }

    fn resolve(file: &SnapshotFile, base_dir: &Path) -> Result<Self> {
        let mut running = RunningPipelines::with_capacity(file.running.len());
        for entry in &file.running {
            let config = entry.to_config(base_dir)?;
            let view = RunningPipelineView::from_config(&config);
            if running.insert(PipelineId::new(entry.id.as_str()), view).is_some() {
                anyhow::bail!("Running pipeline '{}' is listed more than once", entry.id);
            }
        }

        // Duplicates are kept: the resolver's duplicate policy decides.
        let desired = file
            .desired
            .iter()
            .map(|entry| entry.to_config(base_dir))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { running, desired })
    }
}

/// Resolve a glob that may be relative to the snapshot's directory
fn resolve_pattern(base: &Path, pattern: &str) -> String {
    let path = PathBuf::from(pattern);
    if path.is_absolute() {
        pattern.to_string()
    } else {
        base.join(path).display().to_string()
    }
}
