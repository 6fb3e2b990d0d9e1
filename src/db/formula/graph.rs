/*!
A graph view of the ground formula.

Exports the node/child structure as a [petgraph] graph for downstream tooling, e.g. topological evaluation order or structural checks.
Sentinel references are not part of the graph; only allocated nodes appear.
*/

use petgraph::graph::{DiGraph, NodeIndex};

use crate::db::{
    formula::{GroundFormula, GroundNode},
    keys::GroundId,
};

impl GroundFormula {
    /// The formula as a directed graph, with an edge from each node to each allocated child.
    ///
    /// Node weights are the formula's node ids.
    pub fn as_graph(&self) -> DiGraph<GroundId, ()> {
        let mut graph = DiGraph::new();

        let indices: Vec<NodeIndex> = (0..self.len()).map(|id| graph.add_node(id)).collect();

        for (id, node) in self.nodes() {
            let children: &[_] = match node {
                GroundNode::Atom { .. } => &[],
                GroundNode::And { children } => children,
                GroundNode::Or { children, .. } => children,
                GroundNode::Not { child } => {
                    graph.add_edge(indices[id], indices[*child], ());
                    continue;
                }
            };
            for child in children {
                if let Some(c) = child.id() {
                    graph.add_edge(indices[id], indices[c], ());
                }
            }
        }

        graph
    }
}
