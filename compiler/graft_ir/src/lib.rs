//! Graft IR - the graph vocabulary shared by passes and engines.
//!
//! The pass framework never owns a computation graph. It sees one only
//! through the query traits in this crate:
//! - [`OpKind`]: operator-kind tags, including the [`OpKind::Any`] wildcard
//! - [`GraphNode`]: a node's identity, kind and arity
//! - [`Graph`]: read-only enumeration of nodes
//!
//! Concrete graphs (and the engines that match and rewrite them) live
//! outside the framework and implement these traits.

mod graph;
mod op_kind;

pub use graph::{Graph, GraphNode, NodeId};
pub use op_kind::{OpKind, UnknownOpKind};
