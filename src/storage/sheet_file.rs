//! JSON storage for a single sheet
//!
//! A sheet file is one pretty-printed JSON document. Nodes are written in
//! sheet order so diffs stay stable across edits.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::Sheet;

/// A sheet stored at a path on disk
pub struct SheetFile {
    path: PathBuf,
}

impl SheetFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the sheet file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the sheet
    ///
    /// Only the JSON shape is checked here. Structural checks are up to the
    /// caller (see [`Sheet::check_invariants`]).
    pub fn read(&self) -> Result<Sheet> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read sheet: {}", self.path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse sheet: {}", self.path.display()))
    }

    /// Writes the sheet, replacing any existing file atomically
    pub fn write(&self, sheet: &Sheet) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("json.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(&file);
            serde_json::to_writer_pretty(&mut writer, sheet).context("Failed to serialize sheet")?;
            writeln!(writer).context("Failed to write sheet")?;
            writer.flush().context("Failed to flush sheet")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        tracing::debug!(path = %self.path.display(), nodes = sheet.len(), "wrote sheet");
        Ok(())
    }
}
