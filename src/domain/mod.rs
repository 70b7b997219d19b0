//! Domain models for flowsheet
//!
//! Sheets, nodes and templates, without any derived computation or I/O.

mod id;
mod node;
mod sheet;
mod template;
mod graph;

pub use id::{IdError, NodeId, SheetId};
pub use node::{Blocker, Node, NodeAttributes, NodeDraft, NodeKind, NodeStatus, UnknownKind};
pub use sheet::Sheet;
pub use template::Template;
pub use graph::{GraphError, SheetGraph};

#[cfg(test)]
pub(crate) use sheet::fixtures;
