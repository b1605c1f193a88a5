//! Core resolution logic.
//!
//! This module contains:
//! - Resolver: Diff of running vs desired pipelines into ordered actions
//! - Options: Policies for non-reloadable changes and duplicate ids
//! - Metrics: Sink trait and built-in sinks
//!
//! Everything here is pure apart from `tracing` events and metrics reports.

pub mod metrics;
pub mod options;
pub mod resolver;

// Re-export commonly used types
pub use metrics::{InMemoryMetrics, MetricsError, MetricsSink, MetricsSnapshot, NoopMetrics, TracingMetrics};
pub use options::{DuplicatePolicy, NonReloadablePolicy, ResolverOptions};
pub use resolver::{find_duplicates, ResolveError, StateResolver};
