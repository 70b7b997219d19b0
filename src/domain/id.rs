//! Identifiers for sheets and nodes
//!
//! ID Format:
//! - Sheet IDs: `s-{7-char-hash}` (e.g., `s-7f2b4c1`)
//! - Engine-minted node IDs: `{sheet-id}.{sequence}` (e.g., `s-7f2b4c1.4`)
//!
//! Node IDs loaded from an existing sheet are opaque: any non-empty string
//! without whitespace is accepted, so sheets produced by other tools load as-is.
//! The sheet hash is derived from title + creation timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid sheet ID format: expected 's-{{7-char-hash}}', got '{0}'")]
    InvalidSheetId(String),

    #[error("Invalid node ID: '{0}' (must be non-empty and contain no whitespace)")]
    InvalidNodeId(String),
}

/// Generates a 7-character hash from title and timestamp
fn generate_hash(title: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", title, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Sheet ID in the format `s-{7-char-hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SheetId {
    hash: String,
}

impl SheetId {
    /// Creates a new sheet ID from title and timestamp
    pub fn new(title: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(title, timestamp),
        }
    }

    /// Mints the node ID with the given sequence number inside this sheet
    pub fn node_id(&self, sequence: u64) -> NodeId {
        NodeId(format!("{}.{}", self, sequence))
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s-{}", self.hash)
    }
}

impl FromStr for SheetId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(hash) = s.strip_prefix("s-") else {
            return Err(IdError::InvalidSheetId(s.to_string()));
        };

        if hash.len() != 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidSheetId(s.to_string()));
        }

        Ok(Self {
            hash: hash.to_string(),
        })
    }
}

impl TryFrom<String> for SheetId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SheetId> for String {
    fn from(id: SheetId) -> Self {
        id.to_string()
    }
}

/// Node ID, the only handle one node holds on another
///
/// Ordering is plain string ordering and carries no meaning for the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Returns the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(IdError::InvalidNodeId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for NodeId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}
