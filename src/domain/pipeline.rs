//! Desired and running pipeline descriptions.
//!
//! Both sides of a reconciliation carry the same three facts: who the
//! pipeline is, what configuration it has, and whether it can take a new
//! configuration in place.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::fingerprint::{ConfigPart, Fingerprint};
use super::identity::PipelineId;

/// Running pipelines keyed by identity
pub type RunningPipelines = HashMap<PipelineId, RunningPipelineView>;

/// A desired pipeline, as produced by a configuration source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline identity
    pub id: PipelineId,

    /// Fingerprint of the full configuration
    pub fingerprint: Fingerprint,

    /// Whether this pipeline type supports in-place reconfiguration
    pub reloadable: bool,
}

impl PipelineConfig {
    pub fn new(id: impl Into<PipelineId>, fingerprint: Fingerprint, reloadable: bool) -> Self {
        Self {
            id: id.into(),
            fingerprint,
            reloadable,
        }
    }

    /// Build a config from its fragments
    pub fn from_parts(id: impl Into<PipelineId>, parts: &[ConfigPart], reloadable: bool) -> Self {
        Self::new(id, Fingerprint::from_parts(parts), reloadable)
    }

    /// Build a config from a single configuration string
    pub fn from_text(id: impl Into<PipelineId>, text: &str, reloadable: bool) -> Self {
        Self::from_parts(id, &[ConfigPart::from_string(text)], reloadable)
    }
}

/// Read-only snapshot of a running pipeline.
///
/// `fingerprint` is the one the pipeline was created with or last reloaded
/// with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningPipelineView {
    pub id: PipelineId,
    pub fingerprint: Fingerprint,
    pub reloadable: bool,
}

impl RunningPipelineView {
    pub fn new(id: impl Into<PipelineId>, fingerprint: Fingerprint, reloadable: bool) -> Self {
        Self {
            id: id.into(),
            fingerprint,
            reloadable,
        }
    }

    /// Snapshot of a pipeline started (or reloaded) with `config`
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            id: config.id.clone(),
            fingerprint: config.fingerprint.clone(),
            reloadable: config.reloadable,
        }
    }

    /// Whether the running pipeline already has `config`'s content
    pub fn matches(&self, config: &PipelineConfig) -> bool {
        self.fingerprint == config.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_uses_string_part() {
        let config = PipelineConfig::from_text("main", "input { stdin {} }", true);
        assert_eq!(config.id, PipelineId::new("main"));
        assert_eq!(config.fingerprint, Fingerprint::of("input { stdin {} }"));
        assert!(config.reloadable);
    }

    #[test]
    fn test_view_from_config_matches() {
        let config = PipelineConfig::from_text("main", "input { stdin {} }", false);
        let view = RunningPipelineView::from_config(&config);

        assert_eq!(view.id, config.id);
        assert!(!view.reloadable);
        assert!(view.matches(&config));

        let changed = PipelineConfig::from_text("main", "input { generator {} }", false);
        assert!(!view.matches(&changed));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = PipelineConfig::new("main", Fingerprint::new("abc"), true);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("id: main"));
        assert!(yaml.contains("fingerprint: abc"));

        let parsed: PipelineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
