//! Selection state.
//!
//! A single-selected node and a single-selected edge (the one the property
//! panel shows), plus independent multi-selection sets filled by box
//! selection. Sets keep insertion order so hosts see a stable listing.

use fc_core::id::{EdgeId, NodeId};
use fc_core::model::DiagramDocument;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub node: Option<NodeId>,
    pub edge: Option<EdgeId>,
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.node.is_none() && self.edge.is_none() && self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Single-select a node; clears the edge selection.
    pub fn select_node(&mut self, id: NodeId) {
        self.node = Some(id);
        self.edge = None;
    }

    /// Single-select an edge; clears the node selection.
    pub fn select_edge(&mut self, id: EdgeId) {
        self.edge = Some(id);
        self.node = None;
    }

    pub fn clear_single(&mut self) {
        self.node = None;
        self.edge = None;
    }

    pub fn clear_multi(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn clear(&mut self) {
        self.clear_single();
        self.clear_multi();
    }

    /// Replace the multi-selection sets, dropping duplicates.
    pub fn set_multi(&mut self, nodes: Vec<NodeId>, edges: Vec<EdgeId>) {
        self.nodes = dedup(nodes);
        self.edges = dedup(edges);
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node == Some(id) || self.nodes.contains(&id)
    }

    /// Every selected node id, single selection first.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        dedup(self.node.into_iter().chain(self.nodes.iter().copied()).collect())
    }

    pub fn all_edges(&self) -> Vec<EdgeId> {
        dedup(self.edge.into_iter().chain(self.edges.iter().copied()).collect())
    }

    /// Drop every id that no longer exists in `doc`.
    pub fn prune(&mut self, doc: &DiagramDocument) {
        if self.node.is_some_and(|id| doc.node(id).is_none()) {
            self.node = None;
        }
        if self.edge.is_some_and(|id| doc.edge(id).is_none()) {
            self.edge = None;
        }
        self.nodes.retain(|id| doc.node(*id).is_some());
        self.edges.retain(|id| doc.edge(*id).is_some());
    }
}

fn dedup<T: PartialEq + Copy>(ids: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
