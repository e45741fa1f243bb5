//! Declarative match templates.
//!
//! A [`Pattern`] describes the shape of a subgraph: which operator kinds
//! appear, which extra conditions each node must satisfy, and how nodes
//! feed each other. It does not search the graph itself. An external
//! matcher walks the graph starting from the pattern's starter node and
//! calls [`PatternNode::accepts`] to test candidates.
//!
//! Patterns are cheap, short-lived values: a pass builds one per pattern
//! callback invocation and drops it once matching is done.

use std::fmt;
use std::sync::Arc;

use graft_ir::{GraphNode, OpKind};
use smallvec::SmallVec;

use crate::PatternError;

/// Eligibility predicate on a candidate graph node.
///
/// Predicates are read-only checks (tensor rank, input arity, attribute
/// values) applied on top of operator-kind equality. Every predicate
/// attached to a pattern node must hold for a candidate to bind.
pub type RequirementFn = Arc<dyn Fn(&dyn GraphNode) -> bool + Send + Sync>;

/// Handle to a node within its owning [`Pattern`].
///
/// IDs are allocated sequentially from 0 in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PatternNodeId(u32);

impl PatternNodeId {
    /// Create a pattern node ID from a raw index.
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

impl fmt::Display for PatternNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// An input edge of a pattern node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternInput {
    /// Input slot on the consuming node.
    pub offset: usize,
    /// Node producing the value.
    pub producer: PatternNodeId,
}

/// One node of a match template.
pub struct PatternNode {
    id: PatternNodeId,
    op_kind: OpKind,
    requirements: Vec<RequirementFn>,
    inputs: SmallVec<[PatternInput; 2]>,
}

impl PatternNode {
    fn new(id: PatternNodeId, op_kind: OpKind) -> Self {
        PatternNode {
            id,
            op_kind,
            requirements: Vec::new(),
            inputs: SmallVec::new(),
        }
    }

    /// This node's handle within its pattern.
    #[inline]
    pub fn id(&self) -> PatternNodeId {
        self.id
    }

    /// The operator kind this node matches. Fixed at creation.
    #[inline]
    pub fn op_kind(&self) -> OpKind {
        self.op_kind
    }

    /// Whether this node is the `Any` wildcard.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.op_kind.is_any()
    }

    /// Input edges, ordered by input offset.
    pub fn inputs(&self) -> &[PatternInput] {
        &self.inputs
    }

    /// The producer wired into `offset`, if any.
    pub fn input(&self, offset: usize) -> Option<PatternNodeId> {
        self.inputs
            .iter()
            .find(|input| input.offset == offset)
            .map(|input| input.producer)
    }

    /// Number of eligibility predicates attached to this node.
    pub fn requirement_count(&self) -> usize {
        self.requirements.len()
    }

    /// Whether `candidate` can bind to this node.
    ///
    /// The candidate's kind must be admitted by this node's kind and every
    /// attached predicate must hold.
    pub fn accepts(&self, candidate: &dyn GraphNode) -> bool {
        self.op_kind.admits(candidate.op_kind())
            && self.requirements.iter().all(|req| (**req)(candidate))
    }
}

impl fmt::Debug for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternNode")
            .field("id", &self.id)
            .field("op_kind", &self.op_kind)
            .field("requirements", &self.requirements.len())
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// An owned, ordered collection of pattern nodes.
#[derive(Debug, Default)]
pub struct Pattern {
    nodes: Vec<PatternNode>,
}

impl Pattern {
    /// Create an empty pattern.
    pub fn new() -> Self {
        Pattern { nodes: Vec::new() }
    }

    /// Append a node of the given kind and return its handle.
    pub fn create_node(&mut self, op_kind: OpKind) -> PatternNodeId {
        let raw = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        let id = PatternNodeId::new(raw);
        self.nodes.push(PatternNode::new(id, op_kind));
        id
    }

    /// Append a node and wire `inputs` into offsets `0..inputs.len()`.
    pub fn append_node(
        &mut self,
        op_kind: OpKind,
        inputs: &[PatternNodeId],
    ) -> Result<PatternNodeId, PatternError> {
        for &producer in inputs {
            self.node(producer)
                .ok_or(PatternError::UnknownNode { id: producer })?;
        }
        let id = self.create_node(op_kind);
        for (offset, &producer) in inputs.iter().enumerate() {
            self.set_input(id, offset, producer)?;
        }
        Ok(id)
    }

    /// Wire `producer`'s output into input slot `offset` of `consumer`.
    ///
    /// Rewiring an already-wired slot replaces the previous producer.
    pub fn set_input(
        &mut self,
        consumer: PatternNodeId,
        offset: usize,
        producer: PatternNodeId,
    ) -> Result<(), PatternError> {
        if consumer == producer {
            return Err(PatternError::SelfEdge { id: consumer });
        }
        self.node(producer)
            .ok_or(PatternError::UnknownNode { id: producer })?;
        let node = self.node_mut(consumer)?;
        let edge = PatternInput { offset, producer };
        match node.inputs.iter_mut().find(|input| input.offset == offset) {
            Some(existing) => *existing = edge,
            None => {
                node.inputs.push(edge);
                node.inputs.sort_by_key(|input| input.offset);
            }
        }
        Ok(())
    }

    /// Attach an eligibility predicate to a node.
    pub fn append_requirement(
        &mut self,
        id: PatternNodeId,
        requirement: RequirementFn,
    ) -> Result<(), PatternError> {
        self.node_mut(id)?.requirements.push(requirement);
        Ok(())
    }

    /// Look up a node by handle.
    pub fn node(&self, id: PatternNodeId) -> Option<&PatternNode> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: PatternNodeId) -> Result<&mut PatternNode, PatternError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(PatternError::UnknownNode { id })
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> &[PatternNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the pattern has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node matching starts from: the first non-wildcard node.
    ///
    /// A wildcard cannot anchor a match, so a pattern made only of `Any`
    /// nodes (or no nodes) is a programming error.
    pub fn get_starter_node(&self) -> Result<&PatternNode, PatternError> {
        self.nodes
            .iter()
            .find(|node| !node.is_wildcard())
            .ok_or(PatternError::NoStarterNode)
    }
}
