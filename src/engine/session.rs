//! Editing session
//!
//! A session owns the live sheet and everything derived from it. Structural
//! edits go through one path: snapshot, apply, rebuild regions, publish.
//! Nothing is published until all of that has succeeded.

use thiserror::Error;

use super::history::History;
use super::linearize::linearize_regions;
use super::mutation::{self, Clipboard, Edit, MutationError, Position};
use super::navigate::{navigate_horizontal, navigate_vertical, Horizontal, Vertical};
use super::region::{build_regions, Region};
use crate::domain::{GraphError, NodeAttributes, NodeDraft, NodeId, NodeKind, Sheet, Template};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("The {0} dialog is open; confirm or escape it first")]
    ModalOpen(&'static str),

    #[error("No dialog is open")]
    NoModal,

    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    #[error("No node selected")]
    NoSelection,

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A pending question that must be answered before editing continues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    /// Waiting for the kind of a node about to be inserted
    ChooseKind { target: NodeId, position: Position },
    /// Waiting for the user to confirm deleting a node
    ConfirmDelete { target: NodeId },
}

impl Modal {
    pub fn name(&self) -> &'static str {
        match self {
            Modal::ChooseKind { .. } => "choose-kind",
            Modal::ConfirmDelete { .. } => "confirm-delete",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    sheet: Sheet,
    regions: Vec<Region>,
    history: History,
    clipboard: Clipboard,
    current: Option<NodeId>,
    modal: Option<Modal>,
}

impl Session {
    /// Opens a session on a sheet, rejecting sheets that break invariants
    pub fn new(sheet: Sheet) -> Result<Self, SessionError> {
        Self::with_history(sheet, History::new())
    }

    pub fn with_history_capacity(sheet: Sheet, capacity: usize) -> Result<Self, SessionError> {
        Self::with_history(sheet, History::with_capacity(capacity))
    }

    fn with_history(sheet: Sheet, history: History) -> Result<Self, SessionError> {
        sheet.check_invariants()?;
        let regions = build_regions(&sheet)?;
        let current = linearize_regions(&regions).into_iter().next();

        Ok(Self {
            sheet,
            regions,
            history,
            clipboard: Clipboard::new(),
            current,
            modal: None,
        })
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn into_sheet(self) -> Sheet {
        self.sheet
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// The selected node
    pub fn current(&self) -> Option<&NodeId> {
        self.current.as_ref()
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    /// Vertical navigation order of the live sheet
    pub fn order(&self) -> Vec<NodeId> {
        linearize_regions(&self.regions)
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    pub fn select(&mut self, id: &NodeId) -> Result<(), SessionError> {
        self.ensure_no_modal()?;
        if !self.sheet.contains(id) {
            return Err(SessionError::UnknownNode(id.clone()));
        }
        self.current = Some(id.clone());
        Ok(())
    }

    pub fn move_vertical(&mut self, direction: Vertical) -> Result<&NodeId, SessionError> {
        self.ensure_no_modal()?;
        let current = self.target()?;
        let next = navigate_vertical(&self.regions, &current, direction);
        Ok(&*self.current.insert(next))
    }

    pub fn move_horizontal(&mut self, direction: Horizontal) -> Result<&NodeId, SessionError> {
        self.ensure_no_modal()?;
        let current = self.target()?;
        let next = navigate_horizontal(&self.regions, &current, direction);
        Ok(&*self.current.insert(next))
    }

    // ---------------------------------------------------------------------
    // Edits on the selected node
    // ---------------------------------------------------------------------

    /// Inserts a node next to the selection and selects it
    pub fn insert(&mut self, position: Position, draft: NodeDraft) -> Result<NodeId, SessionError> {
        let target = self.target()?;
        let description = format!("insert {position} {target}");
        self.apply(&description, |sheet| {
            mutation::insert_node(sheet, &target, position, draft)
        })?;
        self.target()
    }

    /// Cuts the selected node into the clipboard
    pub fn cut(&mut self) -> Result<(), SessionError> {
        let target = self.target()?;
        let mut clipboard = self.clipboard.clone();
        self.apply(&format!("cut {target}"), |sheet| {
            mutation::cut_node(sheet, &target, &mut clipboard)
        })?;
        self.clipboard = clipboard;
        Ok(())
    }

    /// Pastes the clipboard next to the selection
    ///
    /// Returns `None` without recording history when the clipboard is empty.
    pub fn paste(&mut self, position: Position) -> Result<Option<NodeId>, SessionError> {
        self.ensure_no_modal()?;
        let target = self.target()?;
        if self.clipboard.is_empty() {
            tracing::debug!("paste with empty clipboard");
            return Ok(None);
        }

        let clipboard = self.clipboard.clone();
        self.apply(&format!("paste {position} {target}"), |sheet| {
            mutation::paste_node(sheet, &target, position, &clipboard)
        })?;
        Ok(self.current.clone())
    }

    /// Deletes the selected node without touching the clipboard
    pub fn delete(&mut self) -> Result<(), SessionError> {
        let target = self.target()?;
        self.apply(&format!("delete {target}"), |sheet| {
            mutation::delete_node(sheet, &target)
        })
    }

    /// Instantiates a template after the selected node
    pub fn insert_template(&mut self, template: &Template) -> Result<NodeId, SessionError> {
        let target = self.target()?;
        let description = format!("template {} after {target}", template.name);
        self.apply(&description, |sheet| {
            mutation::insert_template(sheet, &target, template)
        })?;
        self.target()
    }

    pub fn update_attributes(&mut self, attributes: NodeAttributes) -> Result<(), SessionError> {
        let target = self.target()?;
        self.apply(&format!("edit {target}"), |sheet| {
            mutation::update_attributes(sheet, &target, attributes)
        })
    }

    /// Restores the previous snapshot; `false` when there is nothing to undo
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        self.ensure_no_modal()?;
        match self.history.undo(&self.sheet) {
            Some(sheet) => self.restore(sheet).map(|_| true),
            None => Ok(false),
        }
    }

    /// Re-applies an undone snapshot; `false` when there is nothing to redo
    pub fn redo(&mut self) -> Result<bool, SessionError> {
        self.ensure_no_modal()?;
        match self.history.redo() {
            Some(sheet) => self.restore(sheet).map(|_| true),
            None => Ok(false),
        }
    }

    // ---------------------------------------------------------------------
    // Modal flow
    // ---------------------------------------------------------------------

    /// Opens the kind chooser for an insert at `position`
    pub fn begin_insert(&mut self, position: Position) -> Result<(), SessionError> {
        self.ensure_no_modal()?;
        let target = self.target()?;
        self.modal = Some(Modal::ChooseKind { target, position });
        Ok(())
    }

    /// Answers the kind chooser and performs the insert
    pub fn choose_kind(
        &mut self,
        kind: NodeKind,
        title: impl Into<String>,
    ) -> Result<NodeId, SessionError> {
        let Some(Modal::ChooseKind { target, position }) = self.modal.take() else {
            return Err(SessionError::NoModal);
        };

        self.apply(&format!("insert {position} {target}"), |sheet| {
            mutation::insert_node(sheet, &target, position, NodeDraft::new(kind, title))
        })?;
        self.target()
    }

    /// Asks for confirmation before deleting the selected node
    pub fn begin_delete(&mut self) -> Result<(), SessionError> {
        self.ensure_no_modal()?;
        let target = self.target()?;
        self.modal = Some(Modal::ConfirmDelete { target });
        Ok(())
    }

    /// Confirms a pending delete
    pub fn confirm(&mut self) -> Result<(), SessionError> {
        let Some(Modal::ConfirmDelete { target }) = self.modal.take() else {
            return Err(SessionError::NoModal);
        };

        self.apply(&format!("delete {target}"), |sheet| {
            mutation::delete_node(sheet, &target)
        })
    }

    /// Closes the open dialog without changing anything
    ///
    /// Returns `false` if no dialog was open.
    pub fn escape(&mut self) -> bool {
        self.modal.take().is_some()
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn ensure_no_modal(&self) -> Result<(), SessionError> {
        match &self.modal {
            Some(modal) => Err(SessionError::ModalOpen(modal.name())),
            None => Ok(()),
        }
    }

    fn target(&self) -> Result<NodeId, SessionError> {
        self.current.clone().ok_or(SessionError::NoSelection)
    }

    fn apply<F>(&mut self, description: &str, op: F) -> Result<(), SessionError>
    where
        F: FnOnce(&Sheet) -> Result<Edit, MutationError>,
    {
        self.ensure_no_modal()?;

        let Edit { sheet, focus } = op(&self.sheet)?;
        let regions = build_regions(&sheet)?;

        self.history.push(&self.sheet, description);
        self.sheet = sheet;
        self.regions = regions;
        self.current = focus
            .filter(|id| self.sheet.contains(id))
            .or_else(|| self.kept_selection());

        tracing::debug!(%description, nodes = self.sheet.len(), "applied edit");
        Ok(())
    }

    fn restore(&mut self, sheet: Sheet) -> Result<(), SessionError> {
        let regions = build_regions(&sheet)?;
        self.sheet = sheet;
        self.regions = regions;
        self.current = self.kept_selection();
        Ok(())
    }

    /// The current selection if it still exists, else the first node in order
    fn kept_selection(&self) -> Option<NodeId> {
        self.current
            .clone()
            .filter(|id| self.sheet.contains(id))
            .or_else(|| self.order().into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{id, ids, sheet_from};
    use crate::domain::NodeStatus;
    use crate::engine::Branch;

    fn chain() -> Session {
        Session::new(sheet_from(&[("A", "B"), ("B", "C"), ("C", "")])).unwrap()
    }

    fn op(title: &str) -> NodeDraft {
        NodeDraft::new(NodeKind::Operation, title)
    }

    #[test]
    fn opens_on_first_node_in_order() {
        let session = chain();
        assert_eq!(session.current(), Some(&id("A")));
        assert_eq!(session.order(), ids(&["A", "B", "C"]));
    }

    #[test]
    fn rejects_invalid_sheet() {
        let sheet = sheet_from(&[("A", "B"), ("B", "A")]);
        assert!(matches!(
            Session::new(sheet),
            Err(SessionError::Graph(GraphError::Cycle { .. }))
        ));
    }

    #[test]
    fn right_insert_builds_one_branch_region() {
        let mut session = chain();
        session.select(&id("B")).unwrap();
        let x = session.insert(Position::Right, op("X")).unwrap();

        assert_eq!(session.current(), Some(&x));
        assert_eq!(
            session.regions(),
            &[
                Region::Branch {
                    split: id("A"),
                    branches: vec![Branch::new(ids(&["B"])), Branch::new(vec![x.clone()])],
                    convergence: Some(id("C")),
                },
                Region::Single { node: id("C") },
            ]
        );
        assert_eq!(session.order(), vec![id("A"), id("B"), x, id("C")]);
    }

    #[test]
    fn navigation_follows_regions() {
        let mut session = chain();
        session.select(&id("B")).unwrap();
        let x = session.insert(Position::Right, op("X")).unwrap();

        assert_eq!(session.move_horizontal(Horizontal::Left).unwrap(), &id("B"));
        assert_eq!(session.move_vertical(Vertical::Down).unwrap(), &x);
        assert_eq!(session.move_vertical(Vertical::Down).unwrap(), &id("C"));
        assert_eq!(session.move_vertical(Vertical::Down).unwrap(), &id("C"));
    }

    #[test]
    fn select_unknown_node_fails() {
        let mut session = chain();
        assert_eq!(
            session.select(&id("Z")),
            Err(SessionError::UnknownNode(id("Z")))
        );
        assert_eq!(session.current(), Some(&id("A")));
    }

    #[test]
    fn undo_restores_sheet_and_keeps_cursor_when_possible() {
        let mut session = chain();
        let original = session.sheet().clone();
        session.select(&id("B")).unwrap();
        session.insert(Position::After, op("N")).unwrap();
        session.select(&id("C")).unwrap();

        assert!(session.undo().unwrap());
        assert_eq!(session.sheet(), &original);
        assert_eq!(session.current(), Some(&id("C")));
    }

    #[test]
    fn undo_resets_cursor_when_node_is_gone() {
        let mut session = chain();
        let n = session.insert(Position::After, op("N")).unwrap();
        assert_eq!(session.current(), Some(&n));

        session.undo().unwrap();
        assert_eq!(session.current(), Some(&id("A")));
    }

    #[test]
    fn redo_after_undo_restores_edit() {
        let mut session = chain();
        session.select(&id("B")).unwrap();
        session.cut().unwrap();
        let edited = session.sheet().clone();

        session.undo().unwrap();
        assert!(session.sheet().contains(&id("B")));
        assert!(session.redo().unwrap());
        assert_eq!(session.sheet(), &edited);
        assert!(!session.redo().unwrap());
    }

    #[test]
    fn undo_at_start_is_a_no_op() {
        let mut session = chain();
        assert!(!session.undo().unwrap());
    }

    #[test]
    fn cut_then_paste_moves_node() {
        let mut session = chain();
        session.select(&id("B")).unwrap();
        session.cut().unwrap();

        assert_eq!(session.current(), Some(&id("C")));
        assert_eq!(session.clipboard().peek().map(|n| &n.id), Some(&id("B")));

        let pasted = session.paste(Position::After).unwrap().unwrap();
        assert_ne!(pasted, id("B"));
        assert_eq!(session.order(), vec![id("A"), id("C"), pasted]);
    }

    #[test]
    fn empty_paste_records_no_history() {
        let mut session = chain();
        assert_eq!(session.paste(Position::After).unwrap(), None);
        assert!(session.history().is_empty());
    }

    #[test]
    fn failed_edit_leaves_session_untouched() {
        let mut session = Session::new(sheet_from(&[("A", "")])).unwrap();
        let before = session.sheet().clone();

        assert_eq!(
            session.delete(),
            Err(SessionError::Mutation(MutationError::LastNode(id("A"))))
        );
        assert_eq!(session.sheet(), &before);
        assert!(session.history().is_empty());
    }

    #[test]
    fn failed_cut_keeps_clipboard() {
        let mut session = Session::new(sheet_from(&[("A", "")])).unwrap();
        assert!(session.cut().is_err());
        assert!(session.clipboard().is_empty());
    }

    #[test]
    fn open_modal_blocks_edits() {
        let mut session = chain();
        session.begin_insert(Position::After).unwrap();

        let blocked = Err(SessionError::ModalOpen("choose-kind"));
        assert_eq!(session.cut(), blocked);
        assert_eq!(session.delete(), Err(SessionError::ModalOpen("choose-kind")));
        assert_eq!(session.undo(), Err(SessionError::ModalOpen("choose-kind")));
        assert_eq!(
            session.insert(Position::Before, op("N")),
            Err(SessionError::ModalOpen("choose-kind"))
        );
        assert_eq!(session.sheet().len(), 3);
    }

    #[test]
    fn escape_cancels_without_mutation() {
        let mut session = chain();
        let before = session.sheet().clone();
        session.begin_delete().unwrap();

        assert!(session.escape());
        assert!(session.modal().is_none());
        assert_eq!(session.sheet(), &before);
        assert!(!session.escape());
    }

    #[test]
    fn choose_kind_completes_insert() {
        let mut session = chain();
        session.select(&id("C")).unwrap();
        session.begin_insert(Position::After).unwrap();
        let new_id = session.choose_kind(NodeKind::QualityCheck, "Inspect").unwrap();

        let node = session.sheet().get(&new_id).unwrap();
        assert_eq!(node.kind, NodeKind::QualityCheck);
        assert_eq!(node.parents, ids(&["C"]));
        assert!(session.modal().is_none());
    }

    #[test]
    fn confirm_completes_delete() {
        let mut session = chain();
        session.select(&id("B")).unwrap();
        session.begin_delete().unwrap();
        session.confirm().unwrap();

        assert!(!session.sheet().contains(&id("B")));
        assert_eq!(session.confirm(), Err(SessionError::NoModal));
    }

    #[test]
    fn template_goes_after_selection() {
        let mut session = chain();
        let template = Template::new("finish", vec![op("Sand"), op("Paint")]);
        let first = session.insert_template(&template).unwrap();

        assert_eq!(session.sheet().get(&first).unwrap().attributes.title, "Sand");
        assert_eq!(session.order().len(), 5);
        assert_eq!(session.order()[1], first);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn fifty_mutations_each_undone() {
        let mut session = chain();
        let positions = [Position::Before, Position::After, Position::Left, Position::Right];

        for step in 0..50 {
            let before = session.sheet().clone();
            let order = session.order();
            session.select(&order[step % order.len()]).unwrap();
            session
                .insert(positions[step % positions.len()], op("step"))
                .unwrap();
            assert!(session.undo().unwrap());
            assert_eq!(session.sheet(), &before);

            // Keep the edit so the next step starts from a bigger sheet
            assert!(session.redo().unwrap());
        }
        assert_eq!(session.sheet().len(), 53);
    }

    #[test]
    fn attribute_edit_is_undoable() {
        let mut session = chain();
        let mut attributes = NodeAttributes::titled("Cut stock");
        attributes.status = NodeStatus::Done;
        session.update_attributes(attributes).unwrap();
        assert!(session.sheet().get(&id("A")).unwrap().attributes.status.is_complete());

        session.undo().unwrap();
        assert_eq!(
            session.sheet().get(&id("A")).unwrap().attributes.status,
            NodeStatus::Pending
        );
    }
}
