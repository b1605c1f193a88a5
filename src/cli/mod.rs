//! Command-line interface for pipestate.
//!
//! Provides commands for computing an action plan from a snapshot file,
//! fingerprinting configuration fragments, and showing the resolved
//! configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config;
use crate::core::{DuplicatePolicy, MetricsSnapshot, NonReloadablePolicy, StateResolver};
use crate::domain::{ActionKind, PipelineAction};
use crate::snapshot::Snapshot;
use crate::source::LocalSource;

/// pipestate - converge running pipelines to their desired configs
#[derive(Parser, Debug)]
#[command(name = "pipestate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the actions that converge a snapshot's running set to its desired set
    Plan {
        /// Snapshot file (YAML with `running` and `desired` lists)
        snapshot: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Fail on duplicate desired pipeline ids
        #[arg(long)]
        strict: bool,

        /// Override the policy for changed, non-reloadable pipelines
        #[arg(long, value_enum)]
        non_reloadable: Option<NonReloadableArg>,
    },

    /// Print the fingerprint of the configuration fragments matched by a glob
    Fingerprint {
        /// Glob patterns (one fingerprint per pattern)
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One action per line
    Text,

    /// JSON array of actions
    Json,
}

/// Non-reloadable policy for CLI (maps to NonReloadablePolicy)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NonReloadableArg {
    /// Emit reload and let the executor decide
    Reload,

    /// Leave the pipeline running untouched
    Skip,
}

impl From<NonReloadableArg> for NonReloadablePolicy {
    fn from(arg: NonReloadableArg) -> Self {
        match arg {
            NonReloadableArg::Reload => NonReloadablePolicy::Reload,
            NonReloadableArg::Skip => NonReloadablePolicy::Skip,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Plan {
                snapshot,
                format,
                strict,
                non_reloadable,
            } => plan(&snapshot, format, strict, non_reloadable),
            Commands::Fingerprint { patterns } => fingerprint(&patterns),
            Commands::Config => show_config(),
        }
    }
}

/// Resolve a snapshot and print the plan
fn plan(
    snapshot_path: &Path,
    format: OutputFormat,
    strict: bool,
    non_reloadable: Option<NonReloadableArg>,
) -> Result<()> {
    let cfg = config::config()?;

    let mut options = cfg.options;
    if strict {
        options.duplicates = DuplicatePolicy::Reject;
    }
    if let Some(policy) = non_reloadable {
        options.non_reloadable = policy.into();
    }

    let snapshot = Snapshot::from_file(snapshot_path)?;

    let (sink, memory) = cfg.metrics_sink();
    let resolver = StateResolver::with_options(sink, options);
    let actions = resolver
        .try_resolve(&snapshot.running, &snapshot.desired)
        .with_context(|| format!("Failed to resolve snapshot: {}", snapshot_path.display()))?;

    match format {
        OutputFormat::Text => print!("{}", render_text(&actions)),
        OutputFormat::Json => println!("{}", render_json(&actions)?),
    }

    if let Some(memory) = memory {
        eprintln!("{}", render_metrics(&memory.snapshot()));
    }

    Ok(())
}

/// Render actions one per line, with a trailing summary
pub fn render_text(actions: &[PipelineAction]) -> String {
    if actions.is_empty() {
        return "Nothing to do: running pipelines match desired configs\n".to_string();
    }

    let mut out = String::new();
    for action in actions {
        out.push_str(&action.to_string());
        out.push('\n');
    }

    let counts: Vec<String> = ActionKind::ALL
        .iter()
        .map(|kind| {
            let n = actions.iter().filter(|a| a.kind() == *kind).count();
            format!("{} {}", n, kind)
        })
        .collect();
    out.push_str(&format!("\n{} actions ({})\n", actions.len(), counts.join(", ")));

    out
}

/// Render actions as a pretty JSON array
pub fn render_json(actions: &[PipelineAction]) -> Result<String> {
    serde_json::to_string_pretty(actions).context("Failed to serialize actions")
}

fn render_metrics(snapshot: &MetricsSnapshot) -> String {
    format!(
        "[metrics] resolutions={} create={} reload={} stop={} elapsed={:?}",
        snapshot.resolutions,
        snapshot.count(ActionKind::Create),
        snapshot.count(ActionKind::Reload),
        snapshot.count(ActionKind::Stop),
        snapshot.total_duration
    )
}

/// Print one fingerprint per pattern
fn fingerprint(patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        let source = LocalSource::new(pattern.as_str());
        let parts = source.read_parts()?;
        let fp = crate::domain::Fingerprint::from_parts(&parts);
        println!("{}  {} ({} files)", fp, pattern, parts.len());
    }

    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("pipestate configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Resolver:");
    println!("  Non-reloadable changes: {}", cfg.options.non_reloadable);
    println!("  Duplicate pipelines:    {}", cfg.options.duplicates);
    println!();
    println!("Metrics sink: {}", cfg.metrics);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fingerprint, PipelineConfig};

    fn sample_actions() -> Vec<PipelineAction> {
        vec![
            PipelineAction::Create {
                config: PipelineConfig::new("hello_world", Fingerprint::new("aaaaaaaaaaaaaaaa"), true),
            },
            PipelineAction::Stop { id: "main".into() },
        ]
    }

    #[test]
    fn test_cli_parses_plan() {
        let cli = Cli::try_parse_from(["pipestate", "plan", "snap.yaml", "--format", "json", "--strict"]).unwrap();
        match cli.command {
            Commands::Plan {
                snapshot,
                format,
                strict,
                non_reloadable,
            } => {
                assert_eq!(snapshot, PathBuf::from("snap.yaml"));
                assert_eq!(format, OutputFormat::Json);
                assert!(strict);
                assert!(non_reloadable.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_non_reloadable_override() {
        let cli = Cli::try_parse_from(["pipestate", "plan", "snap.yaml", "--non-reloadable", "skip"]).unwrap();
        match cli.command {
            Commands::Plan { non_reloadable, .. } => {
                let policy: NonReloadablePolicy = non_reloadable.unwrap().into();
                assert_eq!(policy, NonReloadablePolicy::Skip);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_fingerprint_requires_pattern() {
        assert!(Cli::try_parse_from(["pipestate", "fingerprint"]).is_err());
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample_actions());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "create hello_world (aaaaaaaaaaaa)");
        assert_eq!(lines[1], "stop main");
        assert_eq!(lines[3], "2 actions (1 create, 0 reload, 1 stop)");
    }

    #[test]
    fn test_render_text_empty() {
        assert!(render_text(&[]).starts_with("Nothing to do"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&sample_actions()).unwrap();
        let parsed: Vec<PipelineAction> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample_actions());
    }
}
