//! Configuration handling for flowsheet
//!
//! Configuration is read from `~/.config/flowsheet/config.toml` (global) and
//! the nearest `.flowsheet.toml` walking up from the working directory
//! (project). Project values win.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{NodeDraft, NodeKind, Template};
use crate::engine::DEFAULT_CAPACITY;

/// File name of the project configuration
pub const PROJECT_FILE: &str = ".flowsheet.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Editor settings
///
/// Both fields are optional so that a project file can override a single
/// value without resetting the other.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo snapshots kept per session (default 50)
    pub history_capacity: Option<usize>,

    /// Kind used when a command does not name one
    pub default_kind: Option<NodeKind>,
}

/// A template as written in a config file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TemplateConfig {
    pub description: String,
    pub steps: Vec<NodeDraft>,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    pub editor: EditorConfig,

    /// Named templates, keyed by name
    pub templates: BTreeMap<String, TemplateConfig>,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    pub editor: EditorConfig,

    pub templates: BTreeMap<String, TemplateConfig>,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let start = std::env::current_dir().context("Failed to read working directory")?;
        Self::load_from(&start)
    }

    /// Loads configuration, searching for a project file upwards from `start`
    pub fn load_from(start: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project_root = Self::find_project_root(start);
        let project = match &project_root {
            Some(root) => Self::load_project_config(root)?,
            None => ProjectConfig::default(),
        };

        let config = Self {
            project,
            global,
            project_root,
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "flowsheet", "flowsheet")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_FILE);

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")
    }

    /// Finds the nearest directory at or above `start` holding a project file
    pub fn find_project_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity() == 0 {
            return Err(ConfigError::Invalid(
                "editor.history_capacity must be at least 1".to_string(),
            ));
        }

        let templates = self.global.templates.iter().chain(&self.project.templates);
        for (name, template) in templates {
            if template.steps.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "template '{name}' has no steps"
                )));
            }
        }
        Ok(())
    }

    /// Undo snapshots kept per session
    pub fn history_capacity(&self) -> usize {
        self.project
            .editor
            .history_capacity
            .or(self.global.editor.history_capacity)
            .unwrap_or(DEFAULT_CAPACITY)
    }

    /// Kind used when a command does not name one
    pub fn default_kind(&self) -> NodeKind {
        self.project
            .editor
            .default_kind
            .or(self.global.editor.default_kind)
            .unwrap_or_default()
    }

    /// Looks up a template by name, project first
    pub fn template(&self, name: &str) -> Option<Template> {
        self.project
            .templates
            .get(name)
            .or_else(|| self.global.templates.get(name))
            .map(|t| Template {
                name: name.to_string(),
                description: t.description.clone(),
                steps: t.steps.clone(),
            })
    }

    /// Names of all available templates
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .global
            .templates
            .keys()
            .chain(self.project.templates.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
