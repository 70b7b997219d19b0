//! Sheet domain model
//!
//! A sheet owns every node of one unit of work. Nodes live in an
//! insertion-ordered arena keyed by id, and refer to each other only through
//! the ids in their adjacency lists.
//!
//! The JSON shape is `{ id, title, created_at, next_sequence, nodes: [Node] }`.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::graph::{GraphError, SheetGraph};
use super::id::{NodeId, SheetId};
use super::node::Node;

fn first_sequence() -> u64 {
    1
}

/// A unit of work: a DAG of operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    /// Unique identifier
    pub id: SheetId,

    /// Human-readable title
    #[serde(default)]
    pub title: String,

    /// When the sheet was created
    pub created_at: DateTime<Utc>,

    /// Next sequence number to try when minting a node id
    #[serde(default = "first_sequence")]
    next_sequence: u64,

    /// All nodes, in insertion order
    #[serde(with = "node_list")]
    nodes: IndexMap<NodeId, Node>,
}

impl Sheet {
    /// Creates an empty sheet
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let created_at = Utc::now();
        Self {
            id: SheetId::new(&title, created_at),
            title,
            created_at,
            next_sequence: first_sequence(),
            nodes: IndexMap::new(),
        }
    }

    /// Creates a sheet from existing nodes, keeping their order
    ///
    /// Only duplicate ids are rejected here; use [`Sheet::check_invariants`]
    /// for structural validation.
    pub fn from_nodes(
        id: SheetId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
        nodes: impl IntoIterator<Item = Node>,
    ) -> Result<Self, GraphError> {
        let mut map = IndexMap::new();
        for node in nodes {
            if map.contains_key(&node.id) {
                return Err(GraphError::DuplicateNode(node.id));
            }
            map.insert(node.id.clone(), node);
        }

        Ok(Self {
            id,
            title: title.into(),
            created_at,
            next_sequence: first_sequence(),
            nodes: map,
        })
    }

    /// Returns the node with the given id
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Returns true if the sheet contains the node
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the sheet has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterates over node ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Iterates over root nodes (no parents) in insertion order
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|node| node.is_root())
    }

    /// Mints an id that is not yet used in this sheet
    pub(crate) fn allocate_id(&mut self) -> NodeId {
        loop {
            let candidate = self.id.node_id(self.next_sequence);
            self.next_sequence += 1;
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Adds a node as-is; the caller is responsible for mirrored edges
    pub(crate) fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Removes a node as-is, keeping the order of the remaining nodes
    pub(crate) fn remove(&mut self, id: &NodeId) -> Option<Node> {
        self.nodes.shift_remove(id)
    }

    /// Verifies the structural invariants of the sheet
    ///
    /// Checks that references resolve, adjacency is mirrored on both sides,
    /// the graph is acyclic, and every node is reachable from a root.
    pub fn check_invariants(&self) -> Result<(), GraphError> {
        let graph = SheetGraph::from_sheet(self)?;
        graph.topological_order()?;

        if let Some(node) = graph.unreachable().into_iter().next() {
            return Err(GraphError::Unreachable { node });
        }
        Ok(())
    }
}

impl PartialEq for Sheet {
    /// Deep equality, including node order
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.created_at == other.created_at
            && self.next_sequence == other.next_sequence
            && self.nodes.len() == other.nodes.len()
            && self.nodes.values().eq(other.nodes.values())
    }
}

impl Eq for Sheet {}

mod node_list {
    use indexmap::IndexMap;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::domain::{Node, NodeId};

    pub fn serialize<S>(nodes: &IndexMap<NodeId, Node>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(nodes.values())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<IndexMap<NodeId, Node>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<Node>::deserialize(deserializer)?;
        let mut map = IndexMap::with_capacity(list.len());
        for node in list {
            if map.contains_key(&node.id) {
                return Err(D::Error::custom(format!("duplicate node id {}", node.id)));
            }
            map.insert(node.id.clone(), node);
        }
        Ok(map)
    }
}
