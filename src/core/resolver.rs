//! Diff-and-reconcile engine.
//!
//! Given the running pipelines and the desired configs, computes the ordered
//! list of actions that converges the former to the latter. The resolver is
//! stateless: every call is independent, so a failed action is simply
//! re-emitted by the next resolution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::domain::{ActionKind, PipelineAction, PipelineConfig, PipelineId, RunningPipelineView, RunningPipelines};

use super::metrics::{MetricsSink, NoopMetrics};
use super::options::{DuplicatePolicy, NonReloadablePolicy, ResolverOptions};

/// Errors from strict resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Pipeline '{id}' is configured {occurrences} times")]
    DuplicatePipeline { id: PipelineId, occurrences: usize },
}

/// Computes lifecycle actions from running and desired pipeline sets
pub struct StateResolver {
    metrics: Arc<dyn MetricsSink>,
    options: ResolverOptions,
}

impl Default for StateResolver {
    fn default() -> Self {
        Self::new(Arc::new(NoopMetrics))
    }
}

impl std::fmt::Debug for StateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateResolver")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl StateResolver {
    /// Create a resolver with default policies
    pub fn new(metrics: Arc<dyn MetricsSink>) -> Self {
        Self::with_options(metrics, ResolverOptions::default())
    }

    pub fn with_options(metrics: Arc<dyn MetricsSink>, options: ResolverOptions) -> Self {
        Self { metrics, options }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Compute the actions that converge `running` to `desired`.
    ///
    /// Output is sorted creates first, then reloads, then stops, each group
    /// by pipeline id. Each pipeline appears at most once. Duplicate ids in
    /// `desired` resolve to their last occurrence.
    #[instrument(skip_all, fields(running = running.len(), desired = desired.len()))]
    pub fn resolve(&self, running: &RunningPipelines, desired: &[PipelineConfig]) -> Vec<PipelineAction> {
        let started = Instant::now();
        let wanted = index_desired(desired);

        let mut actions = Vec::with_capacity(wanted.len() + running.len());

        for (id, config) in &wanted {
            match running.get(*id) {
                None => actions.push(PipelineAction::Create {
                    config: (*config).clone(),
                }),
                Some(view) if view.matches(config) => {}
                Some(view) => {
                    if let Some(action) = self.resolve_changed(view, config) {
                        actions.push(action);
                    }
                }
            }
        }

        for id in running.keys() {
            if !wanted.contains_key(id) {
                actions.push(PipelineAction::Stop { id: id.clone() });
            }
        }

        // Map iteration order is arbitrary; this sort is what makes the output
        // deterministic.
        actions.sort();

        for action in &actions {
            debug!(%action, "planned");
        }
        self.report(&actions, started.elapsed());

        actions
    }

    /// Like [`resolve`](Self::resolve), but honours
    /// [`DuplicatePolicy::Reject`] by failing on duplicate desired ids.
    pub fn try_resolve(
        &self,
        running: &RunningPipelines,
        desired: &[PipelineConfig],
    ) -> Result<Vec<PipelineAction>, ResolveError> {
        if self.options.duplicates == DuplicatePolicy::Reject {
            if let Some((id, occurrences)) = find_duplicates(desired).into_iter().next() {
                return Err(ResolveError::DuplicatePipeline { id, occurrences });
            }
        }

        Ok(self.resolve(running, desired))
    }

    /// Decide what a changed pipeline gets
    fn resolve_changed(&self, view: &RunningPipelineView, config: &PipelineConfig) -> Option<PipelineAction> {
        let in_place = view.reloadable && config.reloadable;

        match self.options.non_reloadable {
            NonReloadablePolicy::Skip if !in_place => {
                warn!(
                    pipeline = %config.id,
                    running = %view.fingerprint.short(),
                    desired = %config.fingerprint.short(),
                    "Configuration changed but pipeline is not reloadable, leaving it running"
                );
                None
            }
            _ => Some(PipelineAction::Reload {
                config: config.clone(),
            }),
        }
    }

    /// Send per-kind counts and timing to the sink; failures are only logged
    fn report(&self, actions: &[PipelineAction], elapsed: Duration) {
        let mut counts = [0u64; 3];
        for action in actions {
            counts[action.kind() as usize] += 1;
        }

        for kind in ActionKind::ALL {
            if let Err(e) = self.metrics.report(kind, counts[kind as usize]) {
                warn!(%kind, error = %e, "Metrics sink rejected action count");
            }
        }
        if let Err(e) = self.metrics.observe_duration(elapsed) {
            warn!(error = %e, "Metrics sink rejected resolution timing");
        }

        if actions.is_empty() {
            debug!("Running pipelines already match desired configs");
        } else {
            info!(
                create = counts[ActionKind::Create as usize],
                reload = counts[ActionKind::Reload as usize],
                stop = counts[ActionKind::Stop as usize],
                "Resolved pipeline actions"
            );
        }
    }
}

/// Index desired configs by id; later entries replace earlier ones
fn index_desired(desired: &[PipelineConfig]) -> HashMap<&PipelineId, &PipelineConfig> {
    let mut wanted = HashMap::with_capacity(desired.len());

    for config in desired {
        if wanted.insert(&config.id, config).is_some() {
            warn!(pipeline = %config.id, "Duplicate pipeline id in desired configs, last occurrence wins");
        }
    }

    wanted
}

/// Ids occurring more than once in `desired`, sorted by id, with their counts
pub fn find_duplicates(desired: &[PipelineConfig]) -> Vec<(PipelineId, usize)> {
    let mut counts: HashMap<&PipelineId, usize> = HashMap::new();
    for config in desired {
        *counts.entry(&config.id).or_insert(0) += 1;
    }

    let mut duplicates: Vec<(PipelineId, usize)> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, n)| (id.clone(), n))
        .collect();
    duplicates.sort();
    duplicates
}
