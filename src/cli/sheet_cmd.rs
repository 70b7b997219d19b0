//! Sheet commands: create, inspect, validate and edit

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use super::script::{parse_script, run_script};
use crate::domain::{NodeDraft, NodeKind, Sheet};
use crate::engine::{build_regions, linearize_regions, new_sheet, Region, Session};
use crate::storage::{Config, SheetFile};

/// Loads a sheet and checks its structure
fn load(path: &Path) -> Result<Sheet> {
    let sheet = SheetFile::new(path).read()?;
    sheet
        .check_invariants()
        .with_context(|| format!("Sheet {} is not a valid flow", path.display()))?;
    Ok(sheet)
}

/// Prints the sheet, or writes it when an output path is given
fn emit(output: &Output, sheet: &Sheet, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            SheetFile::new(path).write(sheet)?;
            output.success(&format!(
                "Wrote sheet {} ({} nodes) to {}",
                sheet.id,
                sheet.len(),
                path.display()
            ));
        }
        None => output.data(sheet),
    }
    Ok(())
}

fn title_of<'a>(sheet: &'a Sheet, id: &crate::domain::NodeId) -> &'a str {
    sheet
        .get(id)
        .map(|n| n.attributes.title.as_str())
        .unwrap_or_default()
}

pub fn new(
    output: &Output,
    config: &Config,
    title: &str,
    kind: Option<&str>,
    root_title: Option<&str>,
    out: Option<&Path>,
) -> Result<()> {
    let kind = match kind {
        Some(k) => k.parse::<NodeKind>()?,
        None => config.default_kind(),
    };
    output.verbose_ctx("new", &format!("Root kind: {}", kind));

    let sheet = new_sheet(title, NodeDraft::new(kind, root_title.unwrap_or(title)));
    emit(output, &sheet, out)
}

pub fn regions(output: &Output, path: &Path) -> Result<()> {
    let sheet = load(path)?;
    let regions = build_regions(&sheet)?;
    output.verbose_ctx("regions", &format!("{} regions", regions.len()));

    if output.is_json() {
        output.data(&regions);
        return Ok(());
    }

    for region in &regions {
        match region {
            Region::Single { node } => {
                output.row(&["single", node.as_str(), title_of(&sheet, node)]);
            }
            Region::Branch {
                split,
                branches,
                convergence,
            } => {
                let meets = convergence
                    .as_ref()
                    .map(|c| format!("-> {}", c))
                    .unwrap_or_else(|| "-> (none)".to_string());
                output.row(&["branch", split.as_str(), title_of(&sheet, split), meets.as_str()]);
                for (index, branch) in branches.iter().enumerate() {
                    let label = format!("  [{}]", index + 1);
                    let nodes = if branch.is_empty() {
                        "(direct)".to_string()
                    } else {
                        branch
                            .nodes
                            .iter()
                            .map(|n| n.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    };
                    output.row(&[label.as_str(), nodes.as_str()]);
                }
            }
        }
    }
    Ok(())
}

pub fn order(output: &Output, path: &Path) -> Result<()> {
    let sheet = load(path)?;
    let order = linearize_regions(&build_regions(&sheet)?);

    if output.is_json() {
        let items: Vec<_> = order
            .iter()
            .filter_map(|id| sheet.get(id))
            .enumerate()
            .map(|(position, node)| {
                serde_json::json!({
                    "position": position,
                    "id": node.id,
                    "type": node.kind,
                    "title": node.attributes.title,
                    "status": node.attributes.status,
                })
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    for (position, node) in order.iter().filter_map(|id| sheet.get(id)).enumerate() {
        let position = position.to_string();
        output.row(&[
            position.as_str(),
            node.id.as_str(),
            node.kind.label(),
            node.attributes.title.as_str(),
        ]);
    }
    Ok(())
}

pub fn check(output: &Output, path: &Path) -> Result<()> {
    let sheet = load(path)?;
    let roots = sheet.roots().count();

    if output.is_json() {
        output.data(&serde_json::json!({
            "valid": true,
            "id": sheet.id,
            "nodes": sheet.len(),
            "roots": roots,
        }));
    } else {
        output.success(&format!(
            "{}: {} nodes, {} roots, ok",
            path.display(),
            sheet.len(),
            roots
        ));
    }
    Ok(())
}

pub fn apply(
    output: &Output,
    config: &Config,
    path: &Path,
    script: &Path,
    out: Option<&Path>,
) -> Result<()> {
    let sheet = load(path)?;
    let text = fs::read_to_string(script)
        .with_context(|| format!("Failed to read script: {}", script.display()))?;
    let commands = parse_script(&text)
        .with_context(|| format!("Failed to parse script: {}", script.display()))?;
    output.verbose_ctx("apply", &format!("{} commands", commands.len()));

    let mut session = Session::with_history_capacity(sheet, config.history_capacity())?;
    run_script(&mut session, &commands, config, output)
        .with_context(|| format!("Failed to apply script: {}", script.display()))?;

    output.verbose_ctx(
        "apply",
        &format!(
            "{} nodes, {} undo snapshots",
            session.sheet().len(),
            session.history().len()
        ),
    );
    emit(output, &session.into_sheet(), out)
}

pub fn templates(output: &Output, config: &Config) -> Result<()> {
    let names = config.template_names();

    if output.is_json() {
        let items: Vec<_> = names
            .iter()
            .filter_map(|name| config.template(name))
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "steps": t.len(),
                })
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    if names.is_empty() {
        output.success("No templates configured");
        return Ok(());
    }

    for template in names.iter().filter_map(|name| config.template(name)) {
        let steps = template.len().to_string();
        output.row(&[
            template.name.as_str(),
            steps.as_str(),
            template.description.as_str(),
        ]);
    }
    Ok(())
}
