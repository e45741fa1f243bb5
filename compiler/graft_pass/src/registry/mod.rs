//! The pass registry.
//!
//! Passes live in a single owning arena in registration order. Two index
//! structures point into it: the execution order (re-ordered by
//! [`PassRegistry::sort_passes`]) and a name map. Neither duplicates a pass,
//! so every pass reachable by name appears exactly once in the execution
//! order and vice versa.
//!
//! # Lifecycle
//!
//! Empty → registering (`register_pass`) → sorted (`sort_passes`) →
//! iterated (`get_passes`). Registration must be complete before anything
//! sorts or iterates; the process-wide instance enforces this by doing all
//! built-in registration inside its one-time initializer.

use std::io::Write;
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{backend, Pass, PassConfig, RegistryError, SerializationError};

/// Builds a pass from `(backend, name)`.
pub type PassFactory = fn(&str, &str) -> Pass;

static GLOBAL_REGISTRY: OnceLock<RwLock<PassRegistry>> = OnceLock::new();

/// Collection and orderer of passes.
///
/// Not `Clone`: passes hold their callbacks by value and there is one
/// owner per pass.
#[derive(Debug, Default)]
pub struct PassRegistry {
    /// Owning arena, registration order.
    passes: Vec<Pass>,
    /// Execution order as arena slots.
    order: Vec<usize>,
    /// Name to arena slot.
    by_name: FxHashMap<String, usize>,
    /// Next registration index. Only ever increases.
    pass_counter: u32,
}

impl PassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        PassRegistry {
            passes: Vec::new(),
            order: Vec::new(),
            by_name: FxHashMap::default(),
            pass_counter: 0,
        }
    }

    /// The process-wide registry with every built-in backend registered
    /// and sorted.
    ///
    /// Created on first access. A built-in pass that fails to register is
    /// logged and left out; the rest of the registry is unaffected.
    pub fn global() -> &'static RwLock<PassRegistry> {
        GLOBAL_REGISTRY.get_or_init(|| {
            let mut registry = PassRegistry::new();
            let failures = backend::register_builtin(&mut registry);
            registry.sort_passes();
            debug!(
                passes = registry.len(),
                failures = failures.len(),
                "global pass registry initialized"
            );
            RwLock::new(registry)
        })
    }

    /// Build a pass with `factory` and register it.
    ///
    /// Returns the stored pass so the call site can configure it fluently.
    /// Names are unique across backends; a duplicate leaves the registry
    /// unchanged.
    pub fn register_pass(
        &mut self,
        backend: &str,
        name: &str,
        factory: PassFactory,
    ) -> Result<&mut Pass, RegistryError> {
        if let Some(&slot) = self.by_name.get(name) {
            return Err(RegistryError::DuplicatePass {
                backend: backend.to_owned(),
                name: name.to_owned(),
                existing_backend: self.passes[slot].backend().to_owned(),
            });
        }

        let mut pass = factory(backend, name);
        let index = self.pass_counter;
        self.pass_counter += 1;
        pass.set_index(index);

        let slot = self.passes.len();
        self.passes.push(pass);
        self.order.push(slot);
        self.by_name.insert(name.to_owned(), slot);
        trace!(backend, name, index, "registered pass");

        Ok(&mut self.passes[slot])
    }

    /// Stable-sort the execution order by descending priority.
    ///
    /// Equal priorities keep registration order; `-0.0` and `0.0` are equal.
    pub fn sort_passes(&mut self) {
        let passes = &self.passes;
        self.order.sort_by(|&a, &b| {
            sort_key(passes[b].priority()).total_cmp(&sort_key(passes[a].priority()))
        });
    }

    /// Look up a pass by name.
    pub fn get_pass(&self, name: &str) -> Result<&Pass, RegistryError> {
        let slot = self.slot(name)?;
        Ok(&self.passes[slot])
    }

    /// Look up a pass by name for reconfiguration.
    pub fn get_pass_mut(&mut self, name: &str) -> Result<&mut Pass, RegistryError> {
        let slot = self.slot(name)?;
        Ok(&mut self.passes[slot])
    }

    fn slot(&self, name: &str) -> Result<usize, RegistryError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::PassNotFound {
                name: name.to_owned(),
            })
    }

    /// Passes in execution order (registration order until sorted).
    pub fn get_passes(&self) -> impl ExactSizeIterator<Item = &Pass> + '_ {
        let passes = &self.passes;
        self.order.iter().map(move |&slot| &passes[slot])
    }

    /// Whether a pass with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Whether no pass is registered.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Write every pass, in execution order, as an override document.
    pub fn save_passes<W: Write>(&self, writer: W) -> Result<(), SerializationError> {
        PassConfig::from_passes(self.get_passes()).to_writer(writer)
    }

    /// Apply priority and enable overrides, then re-sort.
    ///
    /// Every record is validated before anything changes: an unknown name,
    /// a wrong backend or a wrong kind rejects the whole config.
    pub fn apply_config(&mut self, config: &PassConfig) -> Result<(), RegistryError> {
        let mut updates = Vec::with_capacity(config.passes.len());
        for record in &config.passes {
            let slot = self.slot(&record.pass_name)?;
            let pass = &self.passes[slot];
            if pass.backend() != record.pass_backend {
                return Err(RegistryError::BackendMismatch {
                    name: record.pass_name.clone(),
                    registered: pass.backend().to_owned(),
                    found: record.pass_backend.clone(),
                });
            }
            if pass.kind() != record.pass_type {
                return Err(RegistryError::KindMismatch {
                    name: record.pass_name.clone(),
                    registered: pass.kind(),
                    found: record.pass_type,
                });
            }
            updates.push((slot, record.priority, record.enable));
        }

        for (slot, priority, enable) in updates {
            self.passes[slot].set_priority(priority).set_enable(enable);
        }
        self.sort_passes();
        debug!(overrides = config.passes.len(), "applied pass config");
        Ok(())
    }
}

/// Total-order key for a priority with both zeros folded onto `0.0`.
fn sort_key(priority: f32) -> f32 {
    if priority == 0.0 {
        0.0
    } else {
        priority
    }
}

/// Register a transformation pass named after its identifiers.
///
/// ```ignore
/// register_transformation_pass!(registry, cpu, conv_relu_fusion)?
///     .set_priority(9.0)
///     .add_pattern(|pattern| { /* ... */ Ok(()) });
/// ```
#[macro_export]
macro_rules! register_transformation_pass {
    ($registry:expr, $backend:ident, $pass:ident) => {
        $registry.register_pass(
            stringify!($backend),
            stringify!($pass),
            $crate::Pass::transformation,
        )
    };
}

/// Register an analysis pass named after its identifiers.
#[macro_export]
macro_rules! register_analysis_pass {
    ($registry:expr, $backend:ident, $pass:ident) => {
        $registry.register_pass(
            stringify!($backend),
            stringify!($pass),
            $crate::Pass::analysis,
        )
    };
}

#[cfg(test)]
mod tests;
