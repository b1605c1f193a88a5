//! pipestate - Deterministic pipeline state resolver
//!
//! Computes the lifecycle actions (create, reload, stop) that converge a set
//! of running pipelines to a set of desired pipeline configurations.
//!
//! # Architecture
//!
//! The resolver is a pure function of its two inputs:
//! - Running pipelines are matched to desired configs by identity
//! - Changes are detected by comparing content fingerprints
//! - Output is sorted creates, reloads, stops, then by pipeline id
//!
//! Executing the actions, and deciding when to resolve, belong to the
//! caller. Every resolution is independent, so an action that failed is
//! re-emitted by the next one.
//!
//! # Modules
//!
//! - `domain`: Data structures (PipelineId, Fingerprint, PipelineConfig, PipelineAction)
//! - `core`: Resolution logic (StateResolver, policies, metrics sinks)
//! - `source`: Reading config fragments from local files
//! - `snapshot`: YAML snapshots of both resolver inputs
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```
//! use pipestate::{PipelineAction, PipelineConfig, RunningPipelines, StateResolver};
//!
//! let resolver = StateResolver::default();
//! let desired = vec![PipelineConfig::from_text("main", "input { stdin {} }", true)];
//!
//! let actions = resolver.resolve(&RunningPipelines::new(), &desired);
//! assert!(matches!(actions[0], PipelineAction::Create { .. }));
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod snapshot;
pub mod source;

// Re-export main types at crate root for convenience
pub use crate::core::{MetricsSink, NoopMetrics, ResolverOptions, StateResolver};
pub use crate::domain::{
    ActionKind, ConfigPart, Fingerprint, PipelineAction, PipelineConfig, PipelineId, RunningPipelineView,
    RunningPipelines,
};
