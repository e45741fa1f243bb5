//! The pass driver.
//!
//! [`PassManager`] walks a registry's execution order and runs each enabled
//! pass. The enable flag is enforced here, not by the registry: disabled
//! passes are still visited and reported as skipped.
//!
//! Passes run one at a time with exclusive access to the graph. A pass's
//! rewrites are committed before the next pass sees the graph. The first
//! failing pass ends the run; the registry is left as it was.

use graft_ir::Graph;
use tracing::{debug, trace};

use crate::rewrite::RewriteEngine;
use crate::{PassError, PassKind, PassRegistry, PassRun};

/// What happened to one pass during a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass ran.
    Ran(PassRun),
    /// The pass is disabled.
    Skipped,
}

/// One visited pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassVisit {
    pub backend: String,
    pub name: String,
    pub kind: PassKind,
    pub outcome: PassOutcome,
}

/// Visit log of a run, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    visits: Vec<PassVisit>,
}

impl RunReport {
    /// Every visited pass, in order.
    pub fn visits(&self) -> &[PassVisit] {
        &self.visits
    }

    /// Names of passes that ran.
    pub fn executed(&self) -> impl Iterator<Item = &str> + '_ {
        self.visits
            .iter()
            .filter(|visit| matches!(visit.outcome, PassOutcome::Ran(_)))
            .map(|visit| visit.name.as_str())
    }

    /// Names of passes that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &str> + '_ {
        self.visits
            .iter()
            .filter(|visit| visit.outcome == PassOutcome::Skipped)
            .map(|visit| visit.name.as_str())
    }

    /// Rewrites committed across all passes.
    pub fn total_rewrites(&self) -> usize {
        self.visits
            .iter()
            .map(|visit| match visit.outcome {
                PassOutcome::Ran(run) => run.rewrites,
                PassOutcome::Skipped => 0,
            })
            .sum()
    }
}

/// Runs a registry's passes over a graph.
pub struct PassManager<'r> {
    registry: &'r PassRegistry,
    backend: Option<String>,
}

impl<'r> PassManager<'r> {
    /// Drive every pass in `registry`.
    pub fn new(registry: &'r PassRegistry) -> Self {
        PassManager {
            registry,
            backend: None,
        }
    }

    /// Only visit passes owned by `backend`.
    #[must_use]
    pub fn for_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Run the passes in the registry's current order.
    ///
    /// Call [`PassRegistry::sort_passes`] first for priority order.
    #[tracing::instrument(level = "debug", skip_all, fields(backend = ?self.backend))]
    pub fn run<G, E>(&self, graph: &mut G, engine: &mut E) -> Result<RunReport, PassError>
    where
        G: Graph,
        E: RewriteEngine<G> + ?Sized,
    {
        let mut report = RunReport::default();
        let selected = self.registry.get_passes().filter(|pass| {
            self.backend
                .as_deref()
                .map_or(true, |backend| pass.backend() == backend)
        });

        for pass in selected {
            let outcome = if pass.enable() {
                PassOutcome::Ran(pass.run(graph, engine)?)
            } else {
                trace!(pass = pass.name(), "skipping disabled pass");
                PassOutcome::Skipped
            };
            report.visits.push(PassVisit {
                backend: pass.backend().to_owned(),
                name: pass.name().to_owned(),
                kind: pass.kind(),
                outcome,
            });
        }

        debug!(
            visited = report.visits.len(),
            rewrites = report.total_rewrites(),
            "pass pipeline finished"
        );
        Ok(report)
    }
}
