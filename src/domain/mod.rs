//! Domain types for the pipeline state resolver.
//!
//! This module contains the core data structures:
//! - Identity: Pipeline names
//! - Fingerprint: Content hashes of configurations
//! - Pipeline: Desired configs and running snapshots
//! - Action: Lifecycle actions (create, reload, stop)

pub mod action;
pub mod fingerprint;
pub mod identity;
pub mod pipeline;

// Re-export commonly used types
pub use action::{ActionKind, PipelineAction};
pub use fingerprint::{canonical_text, ConfigPart, Fingerprint};
pub use identity::PipelineId;
pub use pipeline::{PipelineConfig, RunningPipelineView, RunningPipelines};
