//! Read-only graph query traits.
//!
//! Eligibility predicates and analysis passes see the graph only through
//! these traits. Mutation belongs to the rewrite engine, which works on the
//! concrete graph type directly.

use std::fmt;

use crate::OpKind;

/// Identity of a node within its graph.
///
/// IDs are assigned by the concrete graph and are only meaningful there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The shape of one graph node as seen by predicates and matchers.
pub trait GraphNode {
    /// This node's identity.
    fn id(&self) -> NodeId;

    /// The operator this node computes. Never [`OpKind::Any`].
    fn op_kind(&self) -> OpKind;

    /// Number of input edges.
    fn input_count(&self) -> usize;

    /// Number of output values.
    fn output_count(&self) -> usize;
}

/// Read-only view of a computation graph.
pub trait Graph {
    /// Number of live nodes.
    fn node_count(&self) -> usize;

    /// Live nodes in the graph's own order.
    fn nodes(&self) -> Box<dyn Iterator<Item = &dyn GraphNode> + '_>;

    /// Count live nodes of a given kind.
    fn count_kind(&self, kind: OpKind) -> usize {
        self.nodes().filter(|node| node.op_kind() == kind).count()
    }
}
