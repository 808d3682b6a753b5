// src/help.rs

//! Plain-text task listings for `--list` and `--dry-run`.

use std::collections::HashSet;
use std::fmt::Write;

use crate::dag::{Node, Registry};
use crate::errors::{Result, SlurpError};
use crate::types::TaskName;

/// Every task with its usage text, dependencies before dependents.
pub fn render_task_list(registry: &Registry) -> Result<String> {
    let mut out = String::from("TASKS:\n");
    for name in registry.execution_order()? {
        if let Some(node) = registry.get(&name) {
            let _ = writeln!(out, "   {:<15} {}", node.name(), node.usage());
        }
    }
    Ok(out)
}

/// Detailed description of a single task.
pub fn render_task(node: &Node) -> String {
    let mut out = format!("TASK:\n   {} - {}\n", node.name(), node.usage());
    if let Some(description) = node.description() {
        let _ = write!(out, "\nDESCRIPTION:\n   {description}\n");
    }
    let deps = node.dependency_names();
    if !deps.is_empty() {
        out.push_str("\nDEPENDENCIES:\n");
        for dep in deps {
            let _ = writeln!(out, "   {dep}");
        }
    }
    out
}

/// Describe each named task; unknown names are an error.
pub fn render_tasks(registry: &Registry, names: &[String]) -> Result<String> {
    let mut out = String::new();
    for name in names {
        let node = registry
            .get(name)
            .ok_or_else(|| SlurpError::TaskNotFound(name.clone()))?;
        out.push_str(&render_task(node));
        out.push('\n');
    }
    Ok(out)
}

/// Tasks that running `names` would execute, dependencies first.
pub fn plan(registry: &Registry, names: &[String]) -> Result<Vec<TaskName>> {
    let mut needed: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = Vec::new();
    for name in names {
        if !registry.contains(name) {
            return Err(SlurpError::TaskNotFound(name.clone()));
        }
        stack.push(name.clone());
    }

    while let Some(name) = stack.pop() {
        if !needed.insert(name.clone()) {
            continue;
        }
        if let Some(node) = registry.get(&name) {
            stack.extend(node.dependency_names().into_iter().map(str::to_string));
        }
    }

    Ok(registry
        .execution_order()?
        .into_iter()
        .filter(|name| needed.contains(name))
        .collect())
}

pub fn render_plan(registry: &Registry, names: &[String]) -> Result<String> {
    let mut out = String::from("slurp dry-run\n");
    for (step, name) in plan(registry, names)?.iter().enumerate() {
        let _ = writeln!(out, "  {}. {name}", step + 1);
    }
    Ok(out)
}
