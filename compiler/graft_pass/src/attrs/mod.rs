//! Typed, multi-valued pass attributes.
//!
//! A pass carries a small strategy table: pattern builders, the optimized
//! pattern builder, analysis callbacks. Several values may share one name
//! (a fusion with structurally different but equivalent patterns registers
//! one builder per shape), so the store is an ordered list of
//! `(name, value)` entries rather than a map.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use graft_ir::Graph;

use crate::{Pattern, PatternError};

/// Attribute name for pattern builders. A pass may register many.
pub const CREATE_PATTERN: &str = "create_pattern";

/// Attribute name for the optimized-pattern builder. At most one per pass.
pub const CREATE_OPT_PATTERN: &str = "create_opt_pattern";

/// Attribute name for analysis callbacks.
pub const ANALYZE: &str = "analyze";

/// Builds one pattern variant to match.
pub type CreatePatternFn = Arc<dyn Fn(&mut Pattern) -> Result<(), PatternError> + Send + Sync>;

/// Builds the pattern a matched subgraph is rewritten into.
pub type CreateOptPatternFn = Arc<dyn Fn(&mut Pattern) -> Result<(), PatternError> + Send + Sync>;

/// Inspects a graph without mutating it.
pub type AnalyzeFn = Arc<dyn Fn(&dyn Graph) + Send + Sync>;

struct AttrEntry {
    name: String,
    value: Box<dyn Any + Send + Sync>,
}

/// Ordered `(name, value)` store with typed retrieval.
#[derive(Default)]
pub struct AttrStore {
    entries: Vec<AttrEntry>,
}

impl AttrStore {
    /// Create an empty store.
    pub fn new() -> Self {
        AttrStore {
            entries: Vec::new(),
        }
    }

    /// Append a value under `name`. Earlier values under the same name
    /// are kept.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.entries.push(AttrEntry {
            name: name.into(),
            value: Box::new(value),
        });
    }

    /// All values of type `T` stored under `name`, in insertion order.
    ///
    /// Values of other types under the same name are skipped. An unknown
    /// name yields an empty vector.
    pub fn get<T: Any>(&self, name: &str) -> Vec<&T> {
        self.entries
            .iter()
            .filter(|entry| entry.name == name)
            .filter_map(|entry| {
                let value: &(dyn Any + Send + Sync) = &*entry.value;
                value.downcast_ref::<T>()
            })
            .collect()
    }

    /// Whether any value is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Number of values stored under `name`, regardless of type.
    pub fn count(&self, name: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.name == name)
            .count()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AttrStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| entry.name.as_str()))
            .finish()
    }
}
