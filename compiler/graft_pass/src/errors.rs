//! Error types for patterns, passes, the registry and pass documents.

use crate::pass::PassKind;
use crate::pattern::PatternNodeId;

/// A pattern is malformed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// Every node is the `Any` wildcard, so nothing can anchor a match.
    #[error("pattern has no starter node: every node is the `Any` wildcard")]
    NoStarterNode,

    /// A node handle does not belong to this pattern.
    #[error("pattern node {id} does not exist in this pattern")]
    UnknownNode { id: PatternNodeId },

    /// A node was wired to consume its own output.
    #[error("pattern node {id} cannot consume its own output")]
    SelfEdge { id: PatternNodeId },
}

/// Registration or lookup failed. These indicate a build or
/// configuration defect rather than a runtime condition.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A pass with this name is already registered.
    #[error("pass `{name}` (backend `{backend}`) is already registered by backend `{existing_backend}`")]
    DuplicatePass {
        backend: String,
        name: String,
        existing_backend: String,
    },

    /// No pass with this name is registered.
    #[error("pass `{name}` not found")]
    PassNotFound { name: String },

    /// An override names a pass under the wrong backend.
    #[error("pass `{name}` belongs to backend `{registered}`, not `{found}`")]
    BackendMismatch {
        name: String,
        registered: String,
        found: String,
    },

    /// An override declares the wrong pass kind.
    #[error("pass `{name}` is {registered}, not {found}")]
    KindMismatch {
        name: String,
        registered: PassKind,
        found: PassKind,
    },
}

/// A pass document or override file could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// The underlying reader or writer failed.
    #[error("i/o error on pass document: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON or a required field is missing.
    #[error("malformed pass document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document describes a pass of a different kind.
    #[error("pass document for `{name}` declares {found}, but the pass is {expected}")]
    KindMismatch {
        name: String,
        expected: PassKind,
        found: PassKind,
    },

    /// The document would rename a pass that a registry already owns.
    #[error("pass document for `{found_backend}::{found_name}` cannot be loaded into registered pass `{backend}::{name}`")]
    IdentityMismatch {
        backend: String,
        name: String,
        found_backend: String,
        found_name: String,
    },

    /// The override file uses a format version this build cannot read.
    #[error("unsupported pass config version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Failure reported by an external matcher or rewrite engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// Matching failed before any rewrite was committed.
    #[error("match failed: {message}")]
    Match { message: String },

    /// Substituting a matched subgraph failed.
    #[error("rewrite failed: {message}")]
    Rewrite { message: String },
}

impl RewriteError {
    /// Create a matching failure.
    #[cold]
    pub fn matching(message: impl Into<String>) -> Self {
        RewriteError::Match {
            message: message.into(),
        }
    }

    /// Create a rewrite failure.
    #[cold]
    pub fn rewrite(message: impl Into<String>) -> Self {
        RewriteError::Rewrite {
            message: message.into(),
        }
    }
}

/// A pass failed while running against a graph.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PassError {
    /// A pattern callback produced an unusable pattern.
    #[error("pass `{pass}`: pattern variant {variant} is invalid: {source}")]
    InvalidPattern {
        pass: String,
        variant: usize,
        #[source]
        source: PatternError,
    },

    /// The optimized-pattern callback produced an unusable pattern.
    #[error("pass `{pass}`: optimized pattern is invalid: {source}")]
    InvalidOptPattern {
        pass: String,
        #[source]
        source: PatternError,
    },

    /// More than one optimized-pattern callback is registered.
    #[error("pass `{pass}` registers {count} optimized patterns, at most one is allowed")]
    MultipleOptPatterns { pass: String, count: usize },

    /// The engine reported a failure.
    #[error("pass `{pass}`: {source}")]
    Rewrite {
        pass: String,
        #[source]
        source: RewriteError,
    },
}

impl PassError {
    /// Name of the pass that failed.
    pub fn pass_name(&self) -> &str {
        match self {
            PassError::InvalidPattern { pass, .. }
            | PassError::InvalidOptPattern { pass, .. }
            | PassError::MultipleOptPatterns { pass, .. }
            | PassError::Rewrite { pass, .. } => pass,
        }
    }
}
