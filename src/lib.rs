//! flowsheet - production flow sheets as editable DAGs
//!
//! A sheet is a directed acyclic graph of operations. Branching work fans
//! out from a split node and meets again at a convergence node. This crate
//! partitions a sheet into regions for display, derives a linear order for
//! keyboard navigation, and applies structural edits with undo/redo.

pub mod domain;
pub mod engine;
pub mod storage;
pub mod cli;

pub use domain::{Node, NodeDraft, NodeId, NodeKind, Sheet, SheetId, Template};
pub use engine::{Position, Region, Session};
