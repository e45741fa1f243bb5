//! Graft Pass - pass management for the Graft graph compiler.
//!
//! This crate provides:
//! - Declarative match templates ([`Pattern`], [`PatternNode`])
//! - The pass model ([`Pass`], [`PassKind`]) with typed multi-valued
//!   attributes ([`AttrStore`])
//! - The [`PassRegistry`]: registration, priority ordering, lookup, and a
//!   process-wide instance holding every built-in backend's passes
//! - Pass documents and override files ([`PassRecord`], [`PassConfig`])
//! - The [`RewriteEngine`] seam to the external matcher/rewriter
//! - A driver ([`PassManager`]) that runs the enabled passes in order
//!
//! # Architecture
//!
//! Passes say *what* to match; engines decide *how*. A transformation pass
//! builds one pattern per registered `create_pattern` callback, asks the
//! engine for matches, and asks it to substitute the pass's optimized
//! pattern for each one. The framework never walks or mutates the graph
//! itself.
//!
//! ```text
//! backend tables ──register──▶ PassRegistry ──sort──▶ PassManager ──run──▶ Pass
//!                                                                          │
//!                                           RewriteEngine ◀──patterns──────┘
//! ```

mod errors;
mod pattern;

pub mod attrs;
pub mod backend;
pub mod config;
pub mod manager;
pub mod pass;
pub mod registry;
pub mod rewrite;
mod serialize;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use attrs::{AnalyzeFn, AttrStore, CreateOptPatternFn, CreatePatternFn};
pub use config::{PassConfig, PASS_CONFIG_ENV, PASS_CONFIG_VERSION};
pub use errors::{PassError, PatternError, RegistryError, RewriteError, SerializationError};
pub use manager::{PassManager, PassOutcome, PassVisit, RunReport};
pub use pass::{Pass, PassKind, PassRun, DEFAULT_PRIORITY};
pub use pattern::{Pattern, PatternInput, PatternNode, PatternNodeId, RequirementFn};
pub use registry::{PassFactory, PassRegistry};
pub use rewrite::{PatternMatch, RewriteEngine};
pub use serialize::PassRecord;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=graft_pass=debug` or `RUST_LOG=graft_pass=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
