//! Reusable chains of operations
//!
//! A template is an ordered list of node drafts. It always instantiates as a
//! straight chain; there is no way to express a split inside a template.

use serde::{Deserialize, Serialize};

use super::node::NodeDraft;

/// A named, ordered chain of node drafts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Template name, used to look it up from config
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Steps in chain order
    #[serde(default)]
    pub steps: Vec<NodeDraft>,
}

impl Template {
    /// Creates a template from its steps
    pub fn new(name: impl Into<String>, steps: Vec<NodeDraft>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps,
        }
    }

    /// Returns the number of nodes the template instantiates
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the template has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
