//! # Storage Layer
//!
//! Reading and writing sheets and configuration.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Sheet | JSON (one document per sheet) | any path given on the command line |
//! | Project config | TOML | `.flowsheet.toml`, nearest parent directory |
//! | Global config | TOML | `~/.config/flowsheet/config.toml` |
//!
//! Sheet writes are atomic (temp file + rename).

mod config;
mod sheet_file;

pub use config::{
    Config, ConfigError, EditorConfig, GlobalConfig, OutputFormat, ProjectConfig, TemplateConfig,
    PROJECT_FILE,
};
pub use sheet_file::SheetFile;
