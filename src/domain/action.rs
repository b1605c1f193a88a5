//! Lifecycle actions produced by the resolver.
//!
//! Executors apply actions in the order they are returned. The order is a
//! contract: all creates, then all reloads, then all stops, each group sorted
//! by pipeline id.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::identity::PipelineId;
use super::pipeline::{PipelineConfig, RunningPipelineView, RunningPipelines};

/// Kind of lifecycle action.
///
/// Variant order is the execution precedence: `Create < Reload < Stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Reload,
    Stop,
}

impl ActionKind {
    /// All kinds in precedence order
    pub const ALL: [ActionKind; 3] = [ActionKind::Create, ActionKind::Reload, ActionKind::Stop];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Reload => "reload",
            ActionKind::Stop => "stop",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single step needed to converge the running fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum PipelineAction {
    /// Start a pipeline that is not running
    Create { config: PipelineConfig },

    /// Give a running pipeline a new configuration
    Reload { config: PipelineConfig },

    /// Stop a pipeline that is no longer desired
    Stop { id: PipelineId },
}

impl PipelineAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PipelineAction::Create { .. } => ActionKind::Create,
            PipelineAction::Reload { .. } => ActionKind::Reload,
            PipelineAction::Stop { .. } => ActionKind::Stop,
        }
    }

    /// Identity of the pipeline this action touches
    pub fn pipeline_id(&self) -> &PipelineId {
        match self {
            PipelineAction::Create { config } | PipelineAction::Reload { config } => &config.id,
            PipelineAction::Stop { id } => id,
        }
    }

    /// Config carried by create and reload actions
    pub fn config(&self) -> Option<&PipelineConfig> {
        match self {
            PipelineAction::Create { config } | PipelineAction::Reload { config } => Some(config),
            PipelineAction::Stop { .. } => None,
        }
    }

    /// Apply this action to an in-memory fleet.
    ///
    /// This is the reference transition function of a pipeline's lifecycle
    /// (absent, running with a fingerprint). Real executors do the same
    /// bookkeeping after they have actually started, reloaded or stopped the
    /// pipeline.
    pub fn apply(self, fleet: &mut RunningPipelines) {
        match self {
            PipelineAction::Create { config } | PipelineAction::Reload { config } => {
                let view = RunningPipelineView::from_config(&config);
                fleet.insert(config.id, view);
            }
            PipelineAction::Stop { id } => {
                fleet.remove(&id);
            }
        }
    }
}

impl Ord for PipelineAction {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind()
            .cmp(&other.kind())
            .then_with(|| self.pipeline_id().cmp(other.pipeline_id()))
            // Only reached for two actions on the same pipeline, which a
            // single resolution never produces.
            .then_with(|| self.config().cmp(&other.config()))
    }
}

impl PartialOrd for PipelineAction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for PipelineAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineAction::Create { config } | PipelineAction::Reload { config } => write!(
                f,
                "{} {} ({})",
                self.kind(),
                config.id,
                config.fingerprint.short()
            ),
            PipelineAction::Stop { id } => write!(f, "stop {}", id),
        }
    }
}
