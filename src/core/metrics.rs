//! Metrics reporting for resolutions.
//!
//! The resolver reports how many actions of each kind it produced and how
//! long the resolution took. Reporting is best-effort: a failing sink is
//! logged and otherwise ignored.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

use crate::domain::ActionKind;

/// Errors a metrics sink can report back to the resolver
#[derive(Debug, Clone, Error)]
pub enum MetricsError {
    #[error("Metrics backend unavailable: {0}")]
    Unavailable(String),

    #[error("Metric rejected: {0}")]
    Rejected(String),
}

/// Receiver of resolution counts and timings.
///
/// Implementations must be `Send + Sync`; one sink is shared by every call to
/// the resolver that owns it.
pub trait MetricsSink: Send + Sync {
    /// Record that a resolution produced `count` actions of `kind`
    fn report(&self, kind: ActionKind, count: u64) -> Result<(), MetricsError>;

    /// Record how long a resolution took
    fn observe_duration(&self, _elapsed: Duration) -> Result<(), MetricsError> {
        Ok(())
    }
}

/// A sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    #[inline]
    fn report(&self, _kind: ActionKind, _count: u64) -> Result<(), MetricsError> {
        Ok(())
    }
}

/// A sink that emits `tracing` events under the `pipestate::metrics` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn report(&self, kind: ActionKind, count: u64) -> Result<(), MetricsError> {
        tracing::debug!(target: "pipestate::metrics", kind = %kind, count, "resolver actions");
        Ok(())
    }

    fn observe_duration(&self, elapsed: Duration) -> Result<(), MetricsError> {
        tracing::debug!(
            target: "pipestate::metrics",
            elapsed_us = elapsed_micros(elapsed),
            "resolution finished"
        );
        Ok(())
    }
}

/// Microseconds, saturating at `u64::MAX`
fn elapsed_micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

/// Point-in-time copy of [`InMemoryMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Cumulative action counts per kind
    pub actions: BTreeMap<ActionKind, u64>,

    /// Number of resolutions observed
    pub resolutions: u64,

    /// Total time spent resolving
    pub total_duration: Duration,
}

impl MetricsSnapshot {
    /// Cumulative count for one kind (0 if never reported)
    pub fn count(&self, kind: ActionKind) -> u64 {
        self.actions.get(&kind).copied().unwrap_or(0)
    }
}

/// Thread-safe in-process counters
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    inner: Mutex<MetricsSnapshot>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn report(&self, kind: ActionKind, count: u64) -> Result<(), MetricsError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| MetricsError::Unavailable(e.to_string()))?;
        *guard.actions.entry(kind).or_insert(0) += count;
        Ok(())
    }

    fn observe_duration(&self, elapsed: Duration) -> Result<(), MetricsError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| MetricsError::Unavailable(e.to_string()))?;
        guard.resolutions += 1;
        guard.total_duration += elapsed;
        Ok(())
    }
}
