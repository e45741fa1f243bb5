//! Shared test fixtures: a tiny dataflow graph and a chain-matching engine.
//!
//! Only compiled in test builds.

use graft_ir::{Graph, GraphNode, NodeId, OpKind};

use crate::rewrite::{PatternMatch, RewriteEngine};
use crate::{Pattern, RewriteError};

pub(crate) struct TestNode {
    id: NodeId,
    kind: OpKind,
    inputs: Vec<NodeId>,
    live: bool,
}

impl GraphNode for TestNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn op_kind(&self) -> OpKind {
        self.kind
    }

    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn output_count(&self) -> usize {
        1
    }
}

/// Append-only node list; rewritten nodes are marked dead, not removed.
#[derive(Default)]
pub(crate) struct TestGraph {
    nodes: Vec<TestNode>,
}

impl TestGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, kind: OpKind, inputs: &[NodeId]) -> NodeId {
        let id = NodeId::new(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(TestNode {
            id,
            kind,
            inputs: inputs.to_vec(),
            live: true,
        });
        id
    }

    /// Build a linear chain `kinds[0] -> kinds[1] -> ...`.
    pub(crate) fn chain(kinds: &[OpKind]) -> Self {
        let mut graph = Self::new();
        let mut prev: Option<NodeId> = None;
        for &kind in kinds {
            let inputs: Vec<NodeId> = prev.into_iter().collect();
            prev = Some(graph.add(kind, &inputs));
        }
        graph
    }

    pub(crate) fn node(&self, id: NodeId) -> &TestNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn inputs(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].inputs
    }

    /// Kinds of live nodes in insertion order.
    pub(crate) fn kinds(&self) -> Vec<OpKind> {
        self.live().map(|node| node.kind).collect()
    }

    fn live(&self) -> impl Iterator<Item = &TestNode> {
        self.nodes.iter().filter(|node| node.live)
    }

    fn consumers(&self, id: NodeId) -> impl Iterator<Item = &TestNode> {
        self.live().filter(move |node| node.inputs.contains(&id))
    }
}

impl Graph for TestGraph {
    fn node_count(&self) -> usize {
        self.live().count()
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = &dyn GraphNode> + '_> {
        Box::new(self.live().map(|node| node as &dyn GraphNode))
    }
}

/// Matches patterns whose nodes form a chain in creation order (node `k`
/// consumes node `k - 1`) and replaces each match with one node of the
/// replacement's starter kind.
#[derive(Default)]
pub(crate) struct ChainEngine {
    pub(crate) fail_match: bool,
    pub(crate) fail_rewrite: bool,
    /// `(variant, replacement kind)` per committed rewrite.
    pub(crate) rewrites: Vec<(usize, Option<OpKind>)>,
}

impl ChainEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl RewriteEngine<TestGraph> for ChainEngine {
    fn find_matches(
        &mut self,
        graph: &TestGraph,
        pattern: &Pattern,
        variant: usize,
    ) -> Result<Vec<PatternMatch>, RewriteError> {
        if self.fail_match {
            return Err(RewriteError::matching("injected match failure"));
        }

        let mut claimed: Vec<NodeId> = Vec::new();
        let mut matches = Vec::new();
        let Some((first, rest)) = pattern.nodes().split_first() else {
            return Ok(matches);
        };

        for anchor in graph.live() {
            if claimed.contains(&anchor.id) || !first.accepts(anchor) {
                continue;
            }
            let mut matched = PatternMatch::new(variant);
            matched.bind(first.id(), anchor.id);
            let mut current = anchor.id;
            let mut complete = true;
            for pattern_node in rest {
                let next = graph.consumers(current).find(|candidate| {
                    !claimed.contains(&candidate.id) && pattern_node.accepts(*candidate)
                });
                match next {
                    Some(node) => {
                        matched.bind(pattern_node.id(), node.id);
                        current = node.id;
                    }
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if complete {
                claimed.extend(matched.graph_nodes());
                matches.push(matched);
            }
        }
        Ok(matches)
    }

    fn rewrite(
        &mut self,
        graph: &mut TestGraph,
        matched: &PatternMatch,
        replacement: Option<&Pattern>,
    ) -> Result<(), RewriteError> {
        if self.fail_rewrite {
            return Err(RewriteError::rewrite("injected rewrite failure"));
        }
        let kind = replacement
            .and_then(|pattern| pattern.get_starter_node().ok())
            .map(crate::PatternNode::op_kind);
        let ids: Vec<NodeId> = matched.graph_nodes().collect();
        let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
            return Err(RewriteError::rewrite("empty match"));
        };

        let mut external = Vec::new();
        for &id in &ids {
            for &input in graph.inputs(id) {
                if !ids.contains(&input) && !external.contains(&input) {
                    external.push(input);
                }
            }
        }

        // The head node becomes the fused node; the rest of the match dies
        // and consumers of the tail read from the head instead.
        for &id in &ids[1..] {
            graph.nodes[id.index()].live = false;
        }
        let head = &mut graph.nodes[first.index()];
        head.kind = kind.unwrap_or(head.kind);
        head.inputs = external;
        if first != last {
            for node in graph.nodes.iter_mut().filter(|node| node.live) {
                for input in &mut node.inputs {
                    if *input == last {
                        *input = first;
                    }
                }
            }
        }

        self.rewrites.push((matched.variant, kind));
        Ok(())
    }
}
