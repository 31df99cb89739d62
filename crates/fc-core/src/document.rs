//! Document mutations.
//!
//! `DiagramDocument` is the only mutation authority over nodes and edges.
//! Every operation borrows the current document and returns a fresh
//! snapshot by value, so callers can detect changes by comparing snapshots
//! and never observe a half-applied edit.

use crate::id::{EdgeId, NodeId};
use crate::model::{DiagramDocument, Edge, EdgePatch, Node, NodePatch};
use std::collections::HashSet;

/// A mutation that would break a document invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("edge {0} already exists")]
    DuplicateEdge(EdgeId),
    #[error("edge endpoint {0} does not exist")]
    MissingEndpoint(NodeId),
    #[error("edge would connect node {0} to itself")]
    SelfLoop(NodeId),
}

impl DiagramDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Both endpoint nodes of an edge, or `None` if the edge is dangling.
    pub fn endpoints(&self, edge: &Edge) -> Option<(&Node, &Node)> {
        Some((self.node(edge.from_node)?, self.node(edge.to_node)?))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    pub fn add_node(&self, mut node: Node) -> Result<DiagramDocument, MutationError> {
        if self.node(node.id).is_some() {
            return Err(MutationError::DuplicateNode(node.id));
        }
        node.clamp_size();
        let mut next = self.clone();
        next.nodes.push(node);
        Ok(next)
    }

    /// Remove a node and every edge touching it.
    pub fn delete_node(&self, id: NodeId) -> DiagramDocument {
        self.bulk_delete(&[id], &[])
    }

    pub fn update_node(&self, id: NodeId, patch: &NodePatch) -> DiagramDocument {
        let mut next = self.clone();
        if let Some(node) = next.nodes.iter_mut().find(|n| n.id == id) {
            patch.apply(node);
        }
        next
    }

    /// Translate several nodes by the same canvas delta.
    pub fn move_nodes(&self, ids: &[NodeId], dx: f32, dy: f32) -> DiagramDocument {
        let mut next = self.clone();
        for node in next.nodes.iter_mut().filter(|n| ids.contains(&n.id)) {
            node.x += dx;
            node.y += dy;
        }
        next
    }

    // ─── Edges ───────────────────────────────────────────────────────────

    pub fn add_edge(&self, edge: Edge) -> Result<DiagramDocument, MutationError> {
        if self.edge(edge.id).is_some() {
            return Err(MutationError::DuplicateEdge(edge.id));
        }
        for endpoint in [edge.from_node, edge.to_node] {
            if self.node(endpoint).is_none() {
                return Err(MutationError::MissingEndpoint(endpoint));
            }
        }
        if edge.from_node == edge.to_node {
            return Err(MutationError::SelfLoop(edge.from_node));
        }
        let mut next = self.clone();
        next.edges.push(edge);
        Ok(next)
    }

    pub fn delete_edge(&self, id: EdgeId) -> DiagramDocument {
        self.bulk_delete(&[], &[id])
    }

    pub fn update_edge(&self, id: EdgeId, patch: &EdgePatch) -> DiagramDocument {
        let mut next = self.clone();
        if let Some(edge) = next.edges.iter_mut().find(|e| e.id == id) {
            patch.apply(edge);
        }
        next
    }

    // ─── Bulk ────────────────────────────────────────────────────────────

    /// Remove the given nodes and edges, plus every edge touching a removed node.
    pub fn bulk_delete(&self, node_ids: &[NodeId], edge_ids: &[EdgeId]) -> DiagramDocument {
        let nodes: HashSet<NodeId> = node_ids.iter().copied().collect();
        let edges: HashSet<EdgeId> = edge_ids.iter().copied().collect();
        DiagramDocument {
            nodes: self
                .nodes
                .iter()
                .filter(|n| !nodes.contains(&n.id))
                .cloned()
                .collect(),
            edges: self
                .edges
                .iter()
                .filter(|e| {
                    !edges.contains(&e.id)
                        && !nodes.contains(&e.from_node)
                        && !nodes.contains(&e.to_node)
                })
                .cloned()
                .collect(),
        }
    }

    /// Append a batch of nodes, skipping any whose id is already taken.
    pub fn append_nodes(&self, batch: impl IntoIterator<Item = Node>) -> DiagramDocument {
        let mut next = self.clone();
        for mut node in batch {
            if next.node(node.id).is_some() {
                log::debug!("append: skipping duplicate node {}", node.id);
                continue;
            }
            node.clamp_size();
            next.nodes.push(node);
        }
        next
    }
}
