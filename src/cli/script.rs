//! Edit scripts for `flow apply`
//!
//! One command per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! select s-1a2b3c4.2
//! insert right qc Inspect welds
//! down
//! cut
//! paste after
//! template finish
//! undo
//! ```

use std::str::FromStr;

use thiserror::Error;

use super::output::Output;
use crate::domain::{NodeDraft, NodeId, NodeKind};
use crate::engine::{Horizontal, Position, Session, SessionError, Vertical};
use crate::storage::Config;

#[derive(Debug, Error, PartialEq)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

impl ScriptError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A single parsed script command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Select(NodeId),
    Vertical(Vertical),
    Horizontal(Horizontal),
    Insert {
        position: Position,
        kind: NodeKind,
        title: String,
    },
    Cut,
    Paste(Position),
    Delete,
    Template(String),
    Undo,
    Redo,
}

/// Parses a whole script, returning each command with its 1-based line
pub fn parse_script(text: &str) -> Result<Vec<(usize, Command)>, ScriptError> {
    let mut commands = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        commands.push((line, parse_line(line, trimmed)?));
    }

    Ok(commands)
}

fn parse_line(line: usize, text: &str) -> Result<Command, ScriptError> {
    let mut words = text.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(ScriptError::new(line, "empty command"));
    };
    let rest: Vec<&str> = words.collect();

    let command = match verb {
        "select" => {
            let [target] = rest[..] else {
                return Err(ScriptError::new(line, "usage: select <node-id>"));
            };
            let id = NodeId::from_str(target).map_err(|e| ScriptError::new(line, e.to_string()))?;
            Command::Select(id)
        }
        "up" | "down" => {
            no_arguments(line, verb, &rest)?;
            let direction = verb
                .parse::<Vertical>()
                .map_err(|_| ScriptError::new(line, format!("unknown direction '{verb}'")))?;
            Command::Vertical(direction)
        }
        "left" | "right" => {
            no_arguments(line, verb, &rest)?;
            let direction = verb
                .parse::<Horizontal>()
                .map_err(|_| ScriptError::new(line, format!("unknown direction '{verb}'")))?;
            Command::Horizontal(direction)
        }
        "insert" => {
            let [position, kind, title @ ..] = &rest[..] else {
                return Err(ScriptError::new(line, "usage: insert <position> <kind> [title]"));
            };
            Command::Insert {
                position: parse_position(line, position)?,
                kind: kind
                    .parse::<NodeKind>()
                    .map_err(|e| ScriptError::new(line, e.to_string()))?,
                title: title.join(" "),
            }
        }
        "cut" => {
            no_arguments(line, verb, &rest)?;
            Command::Cut
        }
        "paste" => {
            let [position] = rest[..] else {
                return Err(ScriptError::new(line, "usage: paste <position>"));
            };
            Command::Paste(parse_position(line, position)?)
        }
        "delete" => {
            no_arguments(line, verb, &rest)?;
            Command::Delete
        }
        "template" => {
            let [name] = rest[..] else {
                return Err(ScriptError::new(line, "usage: template <name>"));
            };
            Command::Template(name.to_string())
        }
        "undo" => {
            no_arguments(line, verb, &rest)?;
            Command::Undo
        }
        "redo" => {
            no_arguments(line, verb, &rest)?;
            Command::Redo
        }
        other => return Err(ScriptError::new(line, format!("unknown command '{other}'"))),
    };

    Ok(command)
}

fn no_arguments(line: usize, verb: &str, rest: &[&str]) -> Result<(), ScriptError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(ScriptError::new(line, format!("'{verb}' takes no arguments")))
    }
}

fn parse_position(line: usize, text: &str) -> Result<Position, ScriptError> {
    text.parse().map_err(|_| {
        ScriptError::new(
            line,
            format!("unknown position '{text}' (expected before, after, left or right)"),
        )
    })
}

/// Runs parsed commands against a session, stopping at the first failure
pub fn run_script(
    session: &mut Session,
    commands: &[(usize, Command)],
    config: &Config,
    output: &Output,
) -> Result<(), ScriptError> {
    for (line, command) in commands {
        let line = *line;
        output.verbose_ctx("apply", &format!("line {line}: {command:?}"));
        let fail = |e: SessionError| ScriptError::new(line, e.to_string());

        match command {
            Command::Select(id) => session.select(id).map_err(fail)?,
            Command::Vertical(direction) => {
                session.move_vertical(*direction).map_err(fail)?;
            }
            Command::Horizontal(direction) => {
                session.move_horizontal(*direction).map_err(fail)?;
            }
            Command::Insert {
                position,
                kind,
                title,
            } => {
                session
                    .insert(*position, NodeDraft::new(*kind, title.as_str()))
                    .map_err(fail)?;
            }
            Command::Cut => session.cut().map_err(fail)?,
            Command::Paste(position) => {
                if session.paste(*position).map_err(fail)?.is_none() {
                    output.verbose_ctx(
                        "apply",
                        &format!("line {line}: clipboard empty, nothing pasted"),
                    );
                }
            }
            Command::Delete => session.delete().map_err(fail)?,
            Command::Template(name) => {
                let template = config
                    .template(name)
                    .ok_or_else(|| ScriptError::new(line, format!("unknown template '{name}'")))?;
                session.insert_template(&template).map_err(fail)?;
            }
            Command::Undo => {
                if !session.undo().map_err(fail)? {
                    output.verbose_ctx("apply", &format!("line {line}: nothing to undo"));
                }
            }
            Command::Redo => {
                if !session.redo().map_err(fail)? {
                    output.verbose_ctx("apply", &format!("line {line}: nothing to redo"));
                }
            }
        }
    }

    Ok(())
}
