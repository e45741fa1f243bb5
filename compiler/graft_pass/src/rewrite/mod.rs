//! The seam between passes and the external matcher/rewriter.
//!
//! A transformation pass owns *what* to match; a [`RewriteEngine`] owns
//! *how*: graph traversal, backtracking, and the actual substitution. The
//! engine is generic over the concrete graph so it can mutate it directly.

use graft_ir::{Graph, NodeId};

use crate::{Pattern, PatternNodeId, RewriteError};

/// One occurrence of a pattern in a graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternMatch {
    /// Which pattern variant of the pass produced this match.
    pub variant: usize,
    /// Pattern node to graph node bindings.
    pub bindings: Vec<(PatternNodeId, NodeId)>,
}

impl PatternMatch {
    /// Create an empty match for a pattern variant.
    pub fn new(variant: usize) -> Self {
        PatternMatch {
            variant,
            bindings: Vec::new(),
        }
    }

    /// Record that `pattern_node` bound to `graph_node`.
    pub fn bind(&mut self, pattern_node: PatternNodeId, graph_node: NodeId) {
        self.bindings.push((pattern_node, graph_node));
    }

    /// The graph node bound to `pattern_node`, if any.
    pub fn graph_node(&self, pattern_node: PatternNodeId) -> Option<NodeId> {
        self.bindings
            .iter()
            .find(|(p, _)| *p == pattern_node)
            .map(|&(_, g)| g)
    }

    /// Bound graph nodes in binding order.
    pub fn graph_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.bindings.iter().map(|&(_, g)| g)
    }

    /// Number of bound nodes.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// External matcher and rewrite engine for a concrete graph type.
pub trait RewriteEngine<G: Graph + ?Sized> {
    /// Find the non-overlapping occurrences of `pattern` in `graph`.
    ///
    /// Matching is read-only: an error here leaves the graph untouched.
    fn find_matches(
        &mut self,
        graph: &G,
        pattern: &Pattern,
        variant: usize,
    ) -> Result<Vec<PatternMatch>, RewriteError>;

    /// Replace a matched subgraph in place.
    ///
    /// `replacement` is the pass's optimized pattern. `None` means the
    /// pass registers no optimized pattern and the engine decides the
    /// substitution itself.
    fn rewrite(
        &mut self,
        graph: &mut G,
        matched: &PatternMatch,
        replacement: Option<&Pattern>,
    ) -> Result<(), RewriteError>;
}
