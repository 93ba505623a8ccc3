//! petgraph views over a `WorkflowGraph`.
//!
//! The arena stores bind edges on their consumers; downstream renderers and
//! the invariant checks want them as a real directed graph.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use super::types::*;

/// One data-flow endpoint in the bind overlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Port(PortId),
    Declaration(DeclId),
    Literal(String),
}

impl From<&Source> for Endpoint {
    fn from(source: &Source) -> Self {
        match source {
            Source::Port(p) => Endpoint::Port(*p),
            Source::Declaration(d) => Endpoint::Declaration(*d),
            Source::Literal(text) => Endpoint::Literal(text.clone()),
        }
    }
}

/// Directed bind graph: edges run from source to consumer.
pub struct BindGraph {
    pub graph: DiGraph<Endpoint, ()>,
    pub indices: HashMap<Endpoint, NodeIndex>,
}

impl BindGraph {
    /// Build the overlay; promoted declarations are left out.
    pub fn build(workflow: &WorkflowGraph) -> Self {
        let mut bind = BindGraph {
            graph: DiGraph::new(),
            indices: HashMap::new(),
        };

        for (i, port) in workflow.ports.iter().enumerate() {
            let consumer = bind.index_of(Endpoint::Port(PortId(i)));
            for source in &port.sources {
                let from = bind.index_of(source.into());
                bind.graph.add_edge(from, consumer, ());
            }
        }

        for (i, decl) in workflow.declarations.iter().enumerate() {
            if decl.promoted_to.is_some() {
                continue;
            }
            let consumer = bind.index_of(Endpoint::Declaration(DeclId(i)));
            for source in &decl.sources {
                let from = bind.index_of(source.into());
                bind.graph.add_edge(from, consumer, ());
            }
        }

        bind
    }

    fn index_of(&mut self, endpoint: Endpoint) -> NodeIndex {
        if let Some(&idx) = self.indices.get(&endpoint) {
            return idx;
        }
        let idx = self.graph.add_node(endpoint.clone());
        self.indices.insert(endpoint, idx);
        idx
    }

    /// Endpoints reading from `endpoint`.
    pub fn consumers(&self, endpoint: &Endpoint) -> Vec<&Endpoint> {
        let Some(&idx) = self.indices.get(endpoint) else {
            return vec![];
        };
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .map(|n| &self.graph[n])
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Ownership tree as a directed graph, parent → child, indexed like the arena.
pub fn ownership_graph(workflow: &WorkflowGraph) -> DiGraph<NodeId, ()> {
    let mut graph = DiGraph::with_capacity(workflow.nodes.len(), workflow.nodes.len());
    let indices: Vec<NodeIndex> = (0..workflow.nodes.len())
        .map(|i| graph.add_node(NodeId(i)))
        .collect();
    for (i, node) in workflow.nodes.iter().enumerate() {
        for child in node.children.values() {
            if let Some(&to) = indices.get(child.0) {
                graph.add_edge(indices[i], to, ());
            }
        }
    }
    graph
}
