//! Snapshot undo/redo
//!
//! Each entry is a full copy of the sheet as it was before a mutation.
//! `cursor` is `None` while the live sheet is newer than every entry; once
//! the user undoes, it points at the entry currently shown.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use crate::domain::Sheet;

/// Number of snapshots kept when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 50;

/// One recorded snapshot
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub sheet: Sheet,

    /// What the mutation that followed this snapshot did
    pub description: String,

    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a history that keeps at most `capacity` snapshots (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
        }
    }

    /// Records the sheet as it was before a mutation
    ///
    /// Anything that could still be redone is discarded. When the history is
    /// full the oldest snapshot is dropped.
    pub fn push(&mut self, sheet: &Sheet, description: impl Into<String>) {
        if let Some(cursor) = self.cursor.take() {
            self.entries.truncate(cursor);
        }

        self.entries.push_back(HistoryEntry {
            sheet: sheet.clone(),
            description: description.into(),
            recorded_at: Utc::now(),
        });

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        tracing::debug!(entries = self.entries.len(), "history push");
    }

    /// Steps back one snapshot
    ///
    /// `live` is the sheet currently shown. On the first undo after a
    /// mutation it is recorded so that redo can return to it.
    pub fn undo(&mut self, live: &Sheet) -> Option<Sheet> {
        let cursor = match self.cursor {
            Some(0) => {
                tracing::debug!("nothing to undo");
                return None;
            }
            Some(cursor) => cursor,
            None if self.entries.is_empty() => {
                tracing::debug!("nothing to undo");
                return None;
            }
            None => {
                // The live sheet is kept even if that goes one over capacity;
                // the next push trims it away with the redo branch.
                self.entries.push_back(HistoryEntry {
                    sheet: live.clone(),
                    description: "live".to_string(),
                    recorded_at: Utc::now(),
                });
                self.entries.len() - 1
            }
        };

        let target = cursor - 1;
        self.cursor = Some(target);
        tracing::debug!(position = target, "undo");
        self.entries.get(target).map(|entry| entry.sheet.clone())
    }

    /// Steps forward one snapshot; `None` when nothing has been undone
    pub fn redo(&mut self) -> Option<Sheet> {
        let cursor = self.cursor?;
        if cursor + 1 >= self.entries.len() {
            tracing::debug!("nothing to redo");
            return None;
        }

        let target = cursor + 1;
        self.cursor = Some(target);
        tracing::debug!(position = target, "redo");
        self.entries.get(target).map(|entry| entry.sheet.clone())
    }

    pub fn can_undo(&self) -> bool {
        match self.cursor {
            Some(cursor) => cursor > 0,
            None => !self.entries.is_empty(),
        }
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor + 1 < self.entries.len())
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Position of the shown snapshot, `None` at the live state
    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    /// Descriptions of all stored snapshots, oldest first
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.description.as_str())
    }
}
