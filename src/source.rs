//! Local configuration fragments.
//!
//! Reads the files matched by a glob pattern into [`ConfigPart`]s, the way a
//! file-based configuration source assembles one pipeline from several
//! files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::domain::{ConfigPart, Fingerprint, PipelineConfig, PipelineId};

/// Source name recorded on fragments read from disk
pub const FILE_SOURCE: &str = "file";

/// Glob-based file source for one pipeline's fragments
#[derive(Debug, Clone)]
pub struct LocalSource {
    pattern: String,
}

impl LocalSource {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Files matched by the pattern, sorted by path
    pub fn matched_paths(&self) -> Result<Vec<PathBuf>> {
        let entries = glob::glob(&self.pattern)
            .with_context(|| format!("Invalid config path pattern: {}", self.pattern))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.with_context(|| format!("Failed to read path matched by {}", self.pattern))?;
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            anyhow::bail!("No config files match: {}", self.pattern);
        }

        Ok(paths)
    }

    /// Read every matched file into a fragment
    pub fn read_parts(&self) -> Result<Vec<ConfigPart>> {
        self.matched_paths()?
            .into_iter()
            .map(|path| -> Result<ConfigPart> {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                debug!(path = %path.display(), bytes = text.len(), "Read config fragment");
                Ok(ConfigPart::new(FILE_SOURCE, path.display().to_string(), text))
            })
            .collect()
    }

    /// Fingerprint of all matched fragments
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        Ok(Fingerprint::from_parts(&self.read_parts()?))
    }

    /// Desired config for `id` built from the matched fragments
    pub fn pipeline_config(&self, id: impl Into<PipelineId>, reloadable: bool) -> Result<PipelineConfig> {
        Ok(PipelineConfig::from_parts(id, &self.read_parts()?, reloadable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_matching_files_in_path_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "02-output.conf", "output {}");
        write(&dir, "01-input.conf", "input {}");
        write(&dir, "notes.txt", "ignored");

        let source = LocalSource::new(format!("{}/*.conf", dir.path().display()));
        let parts = source.read_parts().unwrap();

        assert_eq!(parts.len(), 2);
        assert!(parts[0].id.ends_with("01-input.conf"));
        assert_eq!(parts[0].source, FILE_SOURCE);
        assert_eq!(parts[1].text, "output {}");
    }

    #[test]
    fn test_fingerprint_tracks_file_content() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "main.conf", "input { stdin {} }");
        let source = LocalSource::new(path.display().to_string());

        let before = source.fingerprint().unwrap();
        assert_eq!(before, source.fingerprint().unwrap());

        std::fs::write(&path, "input { generator {} }").unwrap();
        assert_ne!(before, source.fingerprint().unwrap());
    }

    #[test]
    fn test_no_match_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = LocalSource::new(format!("{}/*.conf", dir.path().display()));

        let err = source.read_parts().unwrap_err();
        assert!(err.to_string().contains("No config files match"));
    }

    #[test]
    fn test_pipeline_config_from_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.conf", "input {}");
        let source = LocalSource::new(format!("{}/*.conf", dir.path().display()));

        let config = source.pipeline_config("main", true).unwrap();
        assert_eq!(config.id.as_str(), "main");
        assert_eq!(config.fingerprint, source.fingerprint().unwrap());
    }
}
