//! Built-in backends and their pass registrations.
//!
//! Each backend exposes a table of registration functions, one per pass.
//! Running a table registers every pass it can; a failing entry is logged
//! and skipped so one bad registration never takes the others down.

pub mod cpu;

use tracing::error;

use crate::{PassRegistry, RegistryError};

/// Registers one pass.
pub type RegisterFn = fn(&mut PassRegistry) -> Result<(), RegistryError>;

/// Every compiled-in backend: `(backend name, registration table)`.
pub const BUILTIN_BACKENDS: &[(&str, &[RegisterFn])] = &[(cpu::BACKEND, cpu::PASSES)];

/// Run one registration table. Returns the failures, already logged.
pub fn register_backend(
    registry: &mut PassRegistry,
    backend: &str,
    passes: &[RegisterFn],
) -> Vec<RegistryError> {
    let mut failures = Vec::new();
    for register in passes {
        if let Err(err) = register(registry) {
            error!(backend, error = %err, "pass registration failed");
            failures.push(err);
        }
    }
    failures
}

/// Register every built-in backend.
pub fn register_builtin(registry: &mut PassRegistry) -> Vec<RegistryError> {
    BUILTIN_BACKENDS
        .iter()
        .flat_map(|(backend, passes)| register_backend(registry, backend, passes))
        .collect()
}
