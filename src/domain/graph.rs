//! Graph view of a sheet
//!
//! Structural validation, topological ranking and reachability for a sheet.
//! Uses petgraph for the graph algorithms; the sheet itself stays the single
//! owner of node data and this view only holds ids.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::id::NodeId;
use super::sheet::Sheet;

/// A structurally invalid graph
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Invalid graph: node {node} references missing node {reference}")]
    DanglingReference { node: NodeId, reference: NodeId },

    #[error("Invalid graph: node {node} lists {reference} more than once")]
    DuplicateEdge { node: NodeId, reference: NodeId },

    #[error("Invalid graph: {child} is a child of {parent} but does not list it as a parent (or vice versa)")]
    Asymmetric { parent: NodeId, child: NodeId },

    #[error("Invalid graph: cycle detected through node {node}")]
    Cycle { node: NodeId },

    #[error("Invalid graph: node {node} is not reachable from any root")]
    Unreachable { node: NodeId },

    #[error("Invalid graph: duplicate node id {0}")]
    DuplicateNode(NodeId),
}

/// Directed graph over the ids of a sheet, edges pointing parent -> child
#[derive(Debug, Default)]
pub struct SheetGraph {
    /// The underlying directed graph
    graph: DiGraph<NodeId, ()>,

    /// Map from NodeId to node index
    node_map: HashMap<NodeId, NodeIndex>,
}

impl SheetGraph {
    /// Builds the graph after checking references and adjacency symmetry
    ///
    /// Fails on dangling references, repeated entries in an adjacency list,
    /// or a child/parent pair that is only recorded on one side.
    pub fn from_sheet(sheet: &Sheet) -> Result<Self, GraphError> {
        check_adjacency(sheet)?;

        let mut graph = DiGraph::with_capacity(sheet.len(), sheet.len());
        let mut node_map = HashMap::with_capacity(sheet.len());

        // First pass: add all nodes
        for node in sheet.nodes() {
            let idx = graph.add_node(node.id.clone());
            node_map.insert(node.id.clone(), idx);
        }

        // Second pass: add all edges
        for node in sheet.nodes() {
            let from = node_map[&node.id];
            for child in &node.children {
                graph.add_edge(from, node_map[child], ());
            }
        }

        Ok(Self { graph, node_map })
    }

    /// Returns all node ids in topological order (parents before children)
    ///
    /// Reports the node where a cycle was found as [`GraphError::Cycle`].
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        toposort(&self.graph, None)
            .map(|order| {
                order
                    .into_iter()
                    .map(|idx| self.graph[idx].clone())
                    .collect()
            })
            .map_err(|cycle| GraphError::Cycle {
                node: self.graph[cycle.node_id()].clone(),
            })
    }

    /// Returns the position of every node in topological order
    pub fn ranks(&self) -> Result<HashMap<NodeId, usize>, GraphError> {
        Ok(self
            .topological_order()?
            .into_iter()
            .enumerate()
            .map(|(rank, id)| (id, rank))
            .collect())
    }

    /// Returns the node itself plus everything reachable from it
    pub fn descendants_or_self(&self, id: &NodeId) -> HashSet<NodeId> {
        let Some(&start) = self.node_map.get(id) else {
            return HashSet::new();
        };

        let mut found = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            found.insert(self.graph[idx].clone());
        }
        found
    }

    /// Returns true if `to` can be reached from `from`, counting `from` itself
    pub fn reaches(&self, from: &NodeId, to: &NodeId) -> bool {
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    /// Adds a parent -> child edge between two nodes already in the graph
    ///
    /// Lets a caller keep the view in step with a sheet it is editing.
    pub(crate) fn add_edge(&mut self, parent: &NodeId, child: &NodeId) {
        if let (Some(&from), Some(&to)) = (self.node_map.get(parent), self.node_map.get(child)) {
            self.graph.update_edge(from, to, ());
        }
    }

    /// Returns nodes that cannot be reached from any root
    pub fn unreachable(&self) -> Vec<NodeId> {
        let roots: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();

        let mut seen = HashSet::new();
        for root in roots {
            let mut dfs = Dfs::new(&self.graph, root);
            while let Some(idx) = dfs.next(&self.graph) {
                seen.insert(idx);
            }
        }

        self.graph
            .node_indices()
            .filter(|idx| !seen.contains(idx))
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// Returns the number of nodes in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}

/// Checks that every reference resolves, appears once, and is mirrored
fn check_adjacency(sheet: &Sheet) -> Result<(), GraphError> {
    for node in sheet.nodes() {
        check_list(sheet, &node.id, &node.children)?;
        check_list(sheet, &node.id, &node.parents)?;

        for child in &node.children {
            let mirrored = sheet
                .get(child)
                .is_some_and(|c| c.parents.contains(&node.id));
            if !mirrored {
                return Err(GraphError::Asymmetric {
                    parent: node.id.clone(),
                    child: child.clone(),
                });
            }
        }

        for parent in &node.parents {
            let mirrored = sheet
                .get(parent)
                .is_some_and(|p| p.children.contains(&node.id));
            if !mirrored {
                return Err(GraphError::Asymmetric {
                    parent: parent.clone(),
                    child: node.id.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_list(sheet: &Sheet, owner: &NodeId, list: &[NodeId]) -> Result<(), GraphError> {
    let mut seen = HashSet::with_capacity(list.len());
    for reference in list {
        if !sheet.contains(reference) {
            return Err(GraphError::DanglingReference {
                node: owner.clone(),
                reference: reference.clone(),
            });
        }
        if reference == owner {
            return Err(GraphError::Cycle {
                node: owner.clone(),
            });
        }
        if !seen.insert(reference) {
            return Err(GraphError::DuplicateEdge {
                node: owner.clone(),
                reference: reference.clone(),
            });
        }
    }
    Ok(())
}
