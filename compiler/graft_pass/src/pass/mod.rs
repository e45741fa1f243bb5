//! The pass object model.
//!
//! A [`Pass`] is a named, prioritized unit of work over a graph. Its role
//! is a closed choice, [`PassKind::Analysis`] or [`PassKind::Transformation`],
//! and `run` dispatches on it:
//!
//! - **Analysis** passes call their `analyze` callbacks with a shared
//!   reference to the graph. With no callbacks registered they do nothing.
//! - **Transformation** passes build their patterns, hand them to a
//!   [`RewriteEngine`], and let it rewrite every match.
//!
//! Everything a pass does beyond its metadata lives in its [`AttrStore`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use graft_ir::Graph;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::attrs::{self, AnalyzeFn, AttrStore, CreateOptPatternFn, CreatePatternFn};
use crate::rewrite::RewriteEngine;
use crate::{PassError, Pattern, PatternError};

/// Default priority of a newly constructed pass.
pub const DEFAULT_PRIORITY: f32 = 5.0;

/// The role of a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassKind {
    /// Inspects the graph without changing it.
    Analysis,
    /// Matches patterns and rewrites the graph.
    Transformation,
}

impl PassKind {
    /// Name used in pass documents.
    pub fn as_str(self) -> &'static str {
        match self {
            PassKind::Analysis => "Analysis",
            PassKind::Transformation => "Transformation",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one `run` did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PassRun {
    /// Pattern variants tried (transformation) or callbacks invoked (analysis).
    pub variants: usize,
    /// Matches reported by the engine.
    pub matches: usize,
    /// Rewrites committed.
    pub rewrites: usize,
}

/// A named, prioritized unit of graph analysis or rewriting.
pub struct Pass {
    kind: PassKind,
    backend: String,
    name: String,
    index: u32,
    registered: bool,
    priority: f32,
    enable: bool,
    attrs: AttrStore,
}

impl Pass {
    /// Create a pass. Kind and identity are fixed from here on.
    pub fn new(kind: PassKind, backend: impl Into<String>, name: impl Into<String>) -> Self {
        Pass {
            kind,
            backend: backend.into(),
            name: name.into(),
            index: 0,
            registered: false,
            priority: DEFAULT_PRIORITY,
            enable: true,
            attrs: AttrStore::new(),
        }
    }

    /// Create an analysis pass. Usable as a registry factory.
    pub fn analysis(backend: &str, name: &str) -> Pass {
        Pass::new(PassKind::Analysis, backend, name)
    }

    /// Create a transformation pass. Usable as a registry factory.
    pub fn transformation(backend: &str, name: &str) -> Pass {
        Pass::new(PassKind::Transformation, backend, name)
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registration index. Assigned once by the registry; 0 until then.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Whether a registry owns this pass. Registered passes keep their
    /// backend and name.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub(crate) fn set_index(&mut self, index: u32) {
        self.index = index;
        self.registered = true;
    }

    pub(crate) fn set_identity(&mut self, backend: String, name: String) {
        self.backend = backend;
        self.name = name;
    }

    /// Set the priority. Higher values run earlier.
    pub fn set_priority(&mut self, priority: f32) -> &mut Self {
        self.priority = priority;
        self
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    /// Enable or disable the pass. Drivers skip disabled passes; the pass
    /// itself still runs if asked to.
    pub fn set_enable(&mut self, enable: bool) -> &mut Self {
        self.enable = enable;
        self
    }

    pub fn enable(&self) -> bool {
        self.enable
    }

    /// Attach a named attribute. Repeated names accumulate.
    pub fn set_attr<T: Any + Send + Sync>(&mut self, name: &str, value: T) -> &mut Self {
        self.attrs.insert(name, value);
        self
    }

    /// Every attribute of type `T` under `name`, in insertion order.
    pub fn get_attr<T: Any>(&self, name: &str) -> Vec<&T> {
        self.attrs.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains(name)
    }

    /// The attribute store.
    pub fn attrs(&self) -> &AttrStore {
        &self.attrs
    }

    /// Register a pattern variant builder.
    pub fn add_pattern<F>(&mut self, create: F) -> &mut Self
    where
        F: Fn(&mut Pattern) -> Result<(), PatternError> + Send + Sync + 'static,
    {
        let create: CreatePatternFn = Arc::new(create);
        self.set_attr(attrs::CREATE_PATTERN, create)
    }

    /// Register the optimized-pattern builder.
    pub fn set_opt_pattern<F>(&mut self, create: F) -> &mut Self
    where
        F: Fn(&mut Pattern) -> Result<(), PatternError> + Send + Sync + 'static,
    {
        let create: CreateOptPatternFn = Arc::new(create);
        self.set_attr(attrs::CREATE_OPT_PATTERN, create)
    }

    /// Register an analysis callback.
    pub fn add_analysis<F>(&mut self, analyze: F) -> &mut Self
    where
        F: Fn(&dyn Graph) + Send + Sync + 'static,
    {
        let analyze: AnalyzeFn = Arc::new(analyze);
        self.set_attr(attrs::ANALYZE, analyze)
    }

    /// Run this pass against `graph`.
    ///
    /// Engine failures are propagated as-is; nothing is retried.
    #[tracing::instrument(level = "debug", skip_all, fields(
        pass = %self.name,
        backend = %self.backend,
        kind = %self.kind,
    ))]
    pub fn run<G, E>(&self, graph: &mut G, engine: &mut E) -> Result<PassRun, PassError>
    where
        G: Graph,
        E: RewriteEngine<G> + ?Sized,
    {
        match self.kind {
            PassKind::Analysis => Ok(self.run_analysis(graph)),
            PassKind::Transformation => self.run_transformation(graph, engine),
        }
    }

    fn run_analysis<G: Graph>(&self, graph: &G) -> PassRun {
        let mut run = PassRun::default();
        for analyze in self.attrs.get::<AnalyzeFn>(attrs::ANALYZE) {
            (**analyze)(graph);
            run.variants += 1;
        }
        trace!(callbacks = run.variants, "analysis finished");
        run
    }

    fn run_transformation<G, E>(&self, graph: &mut G, engine: &mut E) -> Result<PassRun, PassError>
    where
        G: Graph,
        E: RewriteEngine<G> + ?Sized,
    {
        let creators = self.attrs.get::<CreatePatternFn>(attrs::CREATE_PATTERN);
        if creators.is_empty() {
            warn!("transformation pass has no pattern to match");
            return Ok(PassRun::default());
        }

        let replacement = self.build_opt_pattern()?;
        let mut run = PassRun::default();

        for (variant, create) in creators.into_iter().enumerate() {
            let pattern = self.build_pattern(create, variant)?;
            let matches = engine
                .find_matches(graph, &pattern, variant)
                .map_err(|source| self.rewrite_error(source))?;
            run.variants += 1;
            run.matches += matches.len();
            trace!(variant, matches = matches.len(), "pattern matched");

            for matched in &matches {
                engine
                    .rewrite(graph, matched, replacement.as_ref())
                    .map_err(|source| self.rewrite_error(source))?;
                run.rewrites += 1;
            }
        }

        debug!(
            variants = run.variants,
            matches = run.matches,
            rewrites = run.rewrites,
            "transformation finished"
        );
        Ok(run)
    }

    fn build_pattern(&self, create: &CreatePatternFn, variant: usize) -> Result<Pattern, PassError> {
        let mut pattern = Pattern::new();
        (**create)(&mut pattern)
            .and_then(|()| pattern.get_starter_node().map(|_| ()))
            .map_err(|source| PassError::InvalidPattern {
                pass: self.name.clone(),
                variant,
                source,
            })?;
        Ok(pattern)
    }

    /// Every pattern variant shares this single replacement.
    fn build_opt_pattern(&self) -> Result<Option<Pattern>, PassError> {
        let creators = self
            .attrs
            .get::<CreateOptPatternFn>(attrs::CREATE_OPT_PATTERN);
        let create = match creators.as_slice() {
            [] => return Ok(None),
            [create] => *create,
            _ => {
                return Err(PassError::MultipleOptPatterns {
                    pass: self.name.clone(),
                    count: creators.len(),
                })
            }
        };

        let mut pattern = Pattern::new();
        (**create)(&mut pattern)
            .and_then(|()| pattern.get_starter_node().map(|_| ()))
            .map_err(|source| PassError::InvalidOptPattern {
                pass: self.name.clone(),
                source,
            })?;
        Ok(Some(pattern))
    }

    #[cold]
    fn rewrite_error(&self, source: crate::RewriteError) -> PassError {
        PassError::Rewrite {
            pass: self.name.clone(),
            source,
        }
    }
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pass")
            .field("kind", &self.kind)
            .field("backend", &self.backend)
            .field("name", &self.name)
            .field("index", &self.index)
            .field("registered", &self.registered)
            .field("priority", &self.priority)
            .field("enable", &self.enable)
            .field("attrs", &self.attrs)
            .finish()
    }
}
