//! Node domain model
//!
//! A node is one operation in a production flow. Its structural part is the
//! pair of adjacency lists (`parents`, `children`), which hold ids only. Every
//! other field lives in [`NodeAttributes`] and is carried through structural
//! edits untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::NodeId;

#[derive(Debug, Error, PartialEq)]
#[error("Unknown node type '{0}' (expected one of: operation, external, material_wait, approval, quality_check, delivery, install)")]
pub struct UnknownKind(pub String);

/// Type of operation a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Work performed on the shop floor
    #[default]
    Operation,
    /// Outsourced to an external vendor
    External,
    /// Waiting on material to arrive
    MaterialWait,
    /// Sign-off gate
    Approval,
    /// Inspection step
    QualityCheck,
    Delivery,
    Install,
}

impl NodeKind {
    /// All kinds, in menu order
    pub const ALL: [NodeKind; 7] = [
        NodeKind::Operation,
        NodeKind::External,
        NodeKind::MaterialWait,
        NodeKind::Approval,
        NodeKind::QualityCheck,
        NodeKind::Delivery,
        NodeKind::Install,
    ];

    /// Returns the serialized name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Operation => "operation",
            NodeKind::External => "external",
            NodeKind::MaterialWait => "material_wait",
            NodeKind::Approval => "approval",
            NodeKind::QualityCheck => "quality_check",
            NodeKind::Delivery => "delivery",
            NodeKind::Install => "install",
        }
    }

    /// Returns a short display label for the kind
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Operation => "op",
            NodeKind::External => "ext",
            NodeKind::MaterialWait => "wait",
            NodeKind::Approval => "appr",
            NodeKind::QualityCheck => "qc",
            NodeKind::Delivery => "dlv",
            NodeKind::Install => "inst",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase().replace('-', "_");
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered || kind.label() == lowered)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Progress of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Pending,
    InProgress,
    Blocked,
    Done,
}

impl NodeStatus {
    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, NodeStatus::Done)
    }
}

/// A recorded reason the node cannot proceed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub reason: String,
    pub raised_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
}

/// Non-structural data of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Human-readable title
    #[serde(default)]
    pub title: String,

    /// Estimated duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,

    #[serde(default)]
    pub status: NodeStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<Blocker>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl NodeAttributes {
    /// Creates attributes with only a title set
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns the unresolved blockers
    pub fn open_blockers(&self) -> impl Iterator<Item = &Blocker> {
        self.blockers.iter().filter(|b| !b.resolved)
    }
}

/// Everything needed to create a node except its id and edges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDraft {
    #[serde(rename = "type", default)]
    pub kind: NodeKind,

    #[serde(flatten)]
    pub attributes: NodeAttributes,
}

impl NodeDraft {
    /// Creates a draft of the given kind and title
    pub fn new(kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            attributes: NodeAttributes::titled(title),
        }
    }
}

/// One operation in a sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,

    #[serde(rename = "type", default)]
    pub kind: NodeKind,

    /// Nodes that must precede this one (empty for a root)
    #[serde(default)]
    pub parents: Vec<NodeId>,

    /// Nodes that follow this one (more than one makes this node a split)
    #[serde(default)]
    pub children: Vec<NodeId>,

    #[serde(flatten)]
    pub attributes: NodeAttributes,
}

impl Node {
    /// Creates an unconnected node from a draft
    pub fn from_draft(id: NodeId, draft: NodeDraft) -> Self {
        Self {
            id,
            kind: draft.kind,
            parents: Vec::new(),
            children: Vec::new(),
            attributes: draft.attributes,
        }
    }

    /// Returns the non-structural part of this node as a draft
    pub fn to_draft(&self) -> NodeDraft {
        NodeDraft {
            kind: self.kind,
            attributes: self.attributes.clone(),
        }
    }

    /// Returns true if this node has no parents
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns true if this node has no children
    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns true if this node starts parallel branches
    pub fn is_split(&self) -> bool {
        self.children.len() > 1
    }
}
