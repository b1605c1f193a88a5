//! Content fingerprints for pipeline configurations.
//!
//! A pipeline's configuration can be split across several fragments (files,
//! inline strings, remote sources). The fingerprint is a SHA-256 digest of
//! the canonical concatenation of those fragments, so two loads of the same
//! configuration always compare equal without re-parsing the text.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Separator placed between fragment texts in the canonical form
pub const PART_SEPARATOR: &str = "\n";

/// One fragment of a pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPart {
    /// Kind of source the fragment came from (e.g. "file", "string")
    pub source: String,

    /// Identifier within that source (e.g. the file path)
    pub id: String,

    /// Raw configuration text
    pub text: String,
}

impl ConfigPart {
    pub fn new(source: impl Into<String>, id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            id: id.into(),
            text: text.into(),
        }
    }

    /// Fragment holding an inline configuration string
    pub fn from_string(text: impl Into<String>) -> Self {
        Self::new("string", "config_string", text)
    }
}

/// Canonical text of a multi-part configuration.
///
/// Parts are ordered by `(source, id)` before joining, so the order in which a
/// loader discovered them does not leak into the fingerprint.
pub fn canonical_text(parts: &[ConfigPart]) -> String {
    let mut ordered: Vec<&ConfigPart> = parts.iter().collect();
    ordered.sort_by(|a, b| (&a.source, &a.id).cmp(&(&b.source, &b.id)));

    ordered
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR)
}

/// Deterministic content hash (lowercase hex SHA-256)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a fingerprint computed elsewhere.
    ///
    /// The value is compared verbatim; callers supplying their own digests
    /// must keep them stable across runs.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fingerprint of a single configuration string
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Fingerprint of the canonical concatenation of `parts`
    pub fn from_parts(parts: &[ConfigPart]) -> Self {
        Self::of(&canonical_text(parts))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, for log lines
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
