//! Resolver policies.
//!
//! Two behaviours are deliberately left to the caller:
//! - what to do with a changed pipeline that cannot reload in place
//! - whether duplicate identities in the desired list are an error

use serde::{Deserialize, Serialize};

/// Handling of changed pipelines that cannot reload in place
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonReloadablePolicy {
    /// Emit `Reload` anyway; the executor decides whether to stop and
    /// recreate the pipeline instead
    #[default]
    Reload,

    /// Emit nothing and leave the running pipeline untouched
    Skip,
}

impl std::fmt::Display for NonReloadablePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonReloadablePolicy::Reload => write!(f, "reload"),
            NonReloadablePolicy::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for NonReloadablePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reload" => Ok(NonReloadablePolicy::Reload),
            "skip" => Ok(NonReloadablePolicy::Skip),
            _ => anyhow::bail!("Unknown non-reloadable policy: {}", s),
        }
    }
}

/// Handling of duplicate identities in the desired list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The last occurrence of an identity wins
    #[default]
    LastWriteWins,

    /// `try_resolve` fails with `ResolveError::DuplicatePipeline`
    Reject,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::LastWriteWins => write!(f, "last-write-wins"),
            DuplicatePolicy::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "last-write-wins" | "last_write_wins" | "lww" => Ok(DuplicatePolicy::LastWriteWins),
            "reject" | "strict" => Ok(DuplicatePolicy::Reject),
            _ => anyhow::bail!("Unknown duplicate policy: {}", s),
        }
    }
}

/// Policies applied by a [`StateResolver`](super::StateResolver)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    #[serde(default)]
    pub non_reloadable: NonReloadablePolicy,

    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}
