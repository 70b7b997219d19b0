//! Structural edits
//!
//! Every operation takes the current sheet by reference and returns a new
//! sheet; the argument is never touched. Callers publish the returned sheet
//! as a whole, which is what keeps history snapshots trivially correct.
//!
//! After each edit the adjacency lists are mirrored on both sides, the graph
//! is acyclic, and every node is reachable from a root. Debug builds assert
//! this on every returned sheet.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{
    GraphError, Node, NodeAttributes, NodeDraft, NodeId, Sheet, SheetGraph, Template,
};

#[derive(Debug, Error, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Template '{0}' has no steps")]
    EmptyTemplate(String),

    #[error("Cannot remove {0}: it is the only node in the sheet")]
    LastNode(NodeId),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Where a new node goes relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Between the target and its predecessors
    Before,
    /// Between the target and its successors
    After,
    /// Parallel sibling placed before the target in every adjacency list
    Left,
    /// Parallel sibling placed after the target in every adjacency list
    Right,
}

impl Position {
    /// Returns true for sibling (parallel) insertion
    pub fn is_sibling(&self) -> bool {
        matches!(self, Position::Left | Position::Right)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Position::Before => "before",
            Position::After => "after",
            Position::Left => "left",
            Position::Right => "right",
        };
        f.write_str(s)
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" | "above" => Ok(Position::Before),
            "after" | "below" => Ok(Position::After),
            "left" => Ok(Position::Left),
            "right" => Ok(Position::Right),
            _ => Err(()),
        }
    }
}

/// Result of a structural edit
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    /// The new sheet
    pub sheet: Sheet,

    /// Node the caller should select next, if the edit suggests one
    pub focus: Option<NodeId>,
}

/// Single-slot store for the most recently cut node
///
/// A second cut overwrites the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    slot: Option<Node>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing has been cut yet
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Returns the cut node with the edges it had when it was cut
    pub fn peek(&self) -> Option<&Node> {
        self.slot.as_ref()
    }

    fn put(&mut self, node: Node) {
        self.slot = Some(node);
    }
}

/// Creates a sheet holding a single root node
pub fn new_sheet(title: impl Into<String>, root: NodeDraft) -> Sheet {
    let mut sheet = Sheet::new(title);
    let id = sheet.allocate_id();
    sheet.insert(Node::from_draft(id, root));
    sheet
}

/// Inserts a new node next to `target`
///
/// `Before`/`After` splice the node into the chain on that side. `Left`/`Right`
/// give it the same parents and children as the target, turning every parent
/// into a split and every child into a convergence point. A root target has no
/// split point to extend, so sibling insertion falls back to `After`.
pub fn insert_node(
    sheet: &Sheet,
    target: &NodeId,
    position: Position,
    draft: NodeDraft,
) -> Result<Edit, MutationError> {
    let target_node = lookup(sheet, target)?;

    let position = if position.is_sibling() && target_node.is_root() {
        tracing::debug!(%target, %position, "sibling insert on a root, inserting after instead");
        Position::After
    } else {
        position
    };

    let mut next = sheet.clone();
    let id = next.allocate_id();
    let mut node = Node::from_draft(id.clone(), draft);

    match position {
        Position::Before => splice_before(&mut next, target, &mut node),
        Position::After => splice_after(&mut next, target, &mut node),
        Position::Left => add_sibling(&mut next, target, &mut node, false),
        Position::Right => add_sibling(&mut next, target, &mut node, true),
    }
    next.insert(node);

    tracing::debug!(%target, %position, new = %id, "inserted node");
    Ok(finish(next, Some(id)))
}

/// Removes `target`, bridging its parents to its children, into the clipboard
///
/// A parent is connected directly to a child only if the child is no longer
/// reachable from it once the target is gone. The clipboard receives the
/// removed node together with its original edges.
pub fn cut_node(
    sheet: &Sheet,
    target: &NodeId,
    clipboard: &mut Clipboard,
) -> Result<Edit, MutationError> {
    let (edit, removed) = detach(sheet, target)?;
    clipboard.put(removed);
    tracing::debug!(%target, "cut node");
    Ok(edit)
}

/// Removes `target` exactly like [`cut_node`] but leaves the clipboard alone
pub fn delete_node(sheet: &Sheet, target: &NodeId) -> Result<Edit, MutationError> {
    let (edit, _) = detach(sheet, target)?;
    tracing::debug!(%target, "deleted node");
    Ok(edit)
}

/// Inserts a copy of the clipboard node next to `target`
///
/// The copy gets a fresh id and keeps every attribute of the cut node.
/// With an empty clipboard this is a no-op: the sheet comes back unchanged
/// and `focus` is `None`.
pub fn paste_node(
    sheet: &Sheet,
    target: &NodeId,
    position: Position,
    clipboard: &Clipboard,
) -> Result<Edit, MutationError> {
    let Some(clipped) = clipboard.peek() else {
        return Ok(Edit {
            sheet: sheet.clone(),
            focus: None,
        });
    };

    insert_node(sheet, target, position, clipped.to_draft())
}

/// Instantiates a template as a chain right after `after`
///
/// The chain's first node becomes the only child of `after`; the children
/// `after` had before are re-pointed to the chain's last node.
pub fn insert_template(
    sheet: &Sheet,
    after: &NodeId,
    template: &Template,
) -> Result<Edit, MutationError> {
    lookup(sheet, after)?;
    if template.is_empty() {
        return Err(MutationError::EmptyTemplate(template.name.clone()));
    }

    let mut next = sheet.clone();
    let chain: Vec<NodeId> = template.steps.iter().map(|_| next.allocate_id()).collect();
    let (first, last) = (chain[0].clone(), chain[chain.len() - 1].clone());

    let original_children = match next.get_mut(after) {
        Some(node) => std::mem::replace(&mut node.children, vec![first.clone()]),
        None => Vec::new(),
    };
    for child in &original_children {
        if let Some(node) = next.get_mut(child) {
            replace_entry(&mut node.parents, after, std::slice::from_ref(&last));
        }
    }

    for (index, (id, draft)) in chain.iter().zip(template.steps.iter()).enumerate() {
        let mut node = Node::from_draft(id.clone(), draft.clone());
        node.parents = match index {
            0 => vec![after.clone()],
            _ => vec![chain[index - 1].clone()],
        };
        node.children = match chain.get(index + 1) {
            Some(following) => vec![following.clone()],
            None => original_children.clone(),
        };
        next.insert(node);
    }

    tracing::debug!(%after, template = %template.name, nodes = chain.len(), "inserted template");
    Ok(finish(next, Some(first)))
}

/// Replaces the attributes of `target`; structure is untouched
pub fn update_attributes(
    sheet: &Sheet,
    target: &NodeId,
    attributes: NodeAttributes,
) -> Result<Edit, MutationError> {
    lookup(sheet, target)?;

    let mut next = sheet.clone();
    if let Some(node) = next.get_mut(target) {
        node.attributes = attributes;
    }

    tracing::debug!(%target, "updated attributes");
    Ok(finish(next, Some(target.clone())))
}

fn lookup<'a>(sheet: &'a Sheet, id: &NodeId) -> Result<&'a Node, MutationError> {
    sheet
        .get(id)
        .ok_or_else(|| MutationError::NodeNotFound(id.clone()))
}

fn finish(sheet: Sheet, focus: Option<NodeId>) -> Edit {
    debug_assert!(
        sheet.check_invariants().is_ok(),
        "edit broke sheet invariants: {:?}",
        sheet.check_invariants()
    );
    Edit { sheet, focus }
}

/// Wires `node` between `target` and all of its parents
fn splice_before(sheet: &mut Sheet, target: &NodeId, node: &mut Node) {
    let parents = match sheet.get_mut(target) {
        Some(t) => std::mem::replace(&mut t.parents, vec![node.id.clone()]),
        None => return,
    };

    for parent in &parents {
        if let Some(p) = sheet.get_mut(parent) {
            replace_entry(&mut p.children, target, std::slice::from_ref(&node.id));
        }
    }

    node.parents = parents;
    node.children = vec![target.clone()];
}

/// Wires `node` between `target` and all of its children
fn splice_after(sheet: &mut Sheet, target: &NodeId, node: &mut Node) {
    let children = match sheet.get_mut(target) {
        Some(t) => std::mem::replace(&mut t.children, vec![node.id.clone()]),
        None => return,
    };

    for child in &children {
        if let Some(c) = sheet.get_mut(child) {
            replace_entry(&mut c.parents, target, std::slice::from_ref(&node.id));
        }
    }

    node.parents = vec![target.clone()];
    node.children = children;
}

/// Gives `node` the same parents and children as `target`
fn add_sibling(sheet: &mut Sheet, target: &NodeId, node: &mut Node, after: bool) {
    let Some(t) = sheet.get(target) else {
        return;
    };
    let (parents, children) = (t.parents.clone(), t.children.clone());

    for parent in &parents {
        if let Some(p) = sheet.get_mut(parent) {
            insert_beside(&mut p.children, target, node.id.clone(), after);
        }
    }
    for child in &children {
        if let Some(c) = sheet.get_mut(child) {
            insert_beside(&mut c.parents, target, node.id.clone(), after);
        }
    }

    node.parents = parents;
    node.children = children;
}

/// Takes `target` out of the sheet and bridges around it
fn detach(sheet: &Sheet, target: &NodeId) -> Result<(Edit, Node), MutationError> {
    lookup(sheet, target)?;
    if sheet.len() == 1 {
        return Err(MutationError::LastNode(target.clone()));
    }

    let mut next = sheet.clone();
    let Some(removed) = next.remove(target) else {
        return Err(MutationError::NodeNotFound(target.clone()));
    };

    // Where the target sat in each neighbour's list; bridges go in that slot.
    let mut child_slots: HashMap<NodeId, usize> = HashMap::new();
    let mut parent_slots: HashMap<NodeId, usize> = HashMap::new();
    for parent in &removed.parents {
        if let Some(p) = next.get_mut(parent) {
            parent_slots.insert(parent.clone(), remove_entry(&mut p.children, target));
        }
    }
    for child in &removed.children {
        if let Some(c) = next.get_mut(child) {
            child_slots.insert(child.clone(), remove_entry(&mut c.parents, target));
        }
    }

    // Bridges added for one parent count when deciding the next one.
    let mut graph = SheetGraph::from_sheet(&next)?;
    for parent in &removed.parents {
        let bridges: Vec<NodeId> = removed
            .children
            .iter()
            .filter(|child| !graph.reaches(parent, child))
            .cloned()
            .collect();
        if bridges.is_empty() {
            continue;
        }
        for child in &bridges {
            graph.add_edge(parent, child);
        }

        if let Some(p) = next.get_mut(parent) {
            let slot = parent_slots.get(parent).copied().unwrap_or(p.children.len());
            p.children.splice(slot..slot, bridges.iter().cloned());
        }
        for child in &bridges {
            if let Some(c) = next.get_mut(child) {
                let slot = child_slots.entry(child.clone()).or_insert(c.parents.len());
                c.parents.insert(*slot, parent.clone());
                *slot += 1;
            }
        }
    }

    let focus = removed
        .children
        .first()
        .or_else(|| removed.parents.first())
        .cloned()
        .or_else(|| next.ids().next().cloned());

    Ok((finish(next, focus), removed))
}

/// Replaces `old` with `new` at the same position
fn replace_entry(list: &mut Vec<NodeId>, old: &NodeId, new: &[NodeId]) {
    if let Some(index) = list.iter().position(|id| id == old) {
        list.splice(index..=index, new.iter().cloned());
    }
}

/// Removes `id` and returns the slot it occupied (end of list if absent)
fn remove_entry(list: &mut Vec<NodeId>, id: &NodeId) -> usize {
    match list.iter().position(|entry| entry == id) {
        Some(index) => {
            list.remove(index);
            index
        }
        None => list.len(),
    }
}

/// Inserts `new` directly before or after `anchor`
fn insert_beside(list: &mut Vec<NodeId>, anchor: &NodeId, new: NodeId, after: bool) {
    let index = match list.iter().position(|id| id == anchor) {
        Some(index) if after => index + 1,
        Some(index) => index,
        None => list.len(),
    };
    list.insert(index, new);
}
