// src/dag/registry.rs

//! Append-only registry of task nodes with dependency validation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::dag::node::Node;
use crate::dag::task::Task;
use crate::engine::CancelSignal;
use crate::errors::{Result, SlurpError};
use crate::types::TaskName;

/// Name → node mapping plus the dependency graph.
///
/// Edge direction: task -> dependency. For
///
/// ```text
/// Task::new("B").after("A")
/// ```
///
/// we add edge B -> A.
#[derive(Debug, Clone)]
pub struct Registry {
    nodes: HashMap<TaskName, Arc<Node>>,
    /// Registration order; doubles as a partial topological order.
    order: Vec<TaskName>,
    graph: DiGraph<TaskName, ()>,
    indices: HashMap<TaskName, NodeIndex>,
    root_task: TaskName,
    signal: CancelSignal,
}

impl Registry {
    pub(crate) fn new(root_task: impl Into<TaskName>, signal: CancelSignal) -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            graph: DiGraph::new(),
            indices: HashMap::new(),
            root_task: root_task.into(),
            signal,
        }
    }

    /// Register a batch of tasks.
    ///
    /// The batch is atomic: if any task is rejected, none of the batch is
    /// added and the registry is left exactly as it was.
    pub fn register<I>(&mut self, tasks: I) -> Result<()>
    where
        I: IntoIterator<Item = Task>,
    {
        let mut staged = self.clone();
        for (position, task) in tasks.into_iter().enumerate() {
            staged.insert(position, task)?;
        }
        *self = staged;
        Ok(())
    }

    fn insert(&mut self, position: usize, task: Task) -> Result<()> {
        let name = task.name().to_string();
        if name.is_empty() {
            return Err(SlurpError::ConfigError(format!(
                "task {position} missing name"
            )));
        }

        let Some(action) = task.action_handle() else {
            return Err(SlurpError::ConfigError(format!(
                "task {name} missing action"
            )));
        };

        let usage = match task.usage_text() {
            Some(usage) if !usage.is_empty() => usage.to_string(),
            _ => {
                return Err(SlurpError::ConfigError(format!(
                    "task {name} missing usage"
                )));
            }
        };

        if self.nodes.contains_key(&name) {
            return Err(SlurpError::DuplicateTask(name));
        }

        let mut seen = HashSet::new();
        let mut deps = Vec::with_capacity(task.dependencies().len());
        for dep in task.dependencies() {
            if *dep == name {
                return Err(SlurpError::DagCycle(format!(
                    "task '{name}' cannot depend on itself"
                )));
            }
            if !seen.insert(dep.as_str()) {
                continue;
            }
            let node = self
                .nodes
                .get(dep)
                .ok_or_else(|| SlurpError::MissingDependency {
                    task: name.clone(),
                    dependency: dep.clone(),
                })?;
            deps.push(Arc::clone(node));
        }

        let index = self.graph.add_node(name.clone());
        for dep in &deps {
            let dep_index = self.indices[dep.name()];
            // Dependencies are registered before their dependents, so the
            // new node cannot be reachable from any of them yet.
            debug_assert!(!has_path_connecting(&self.graph, dep_index, index, None));
            self.graph.add_edge(index, dep_index, ());
        }

        let node = Node::new(
            name.clone(),
            usage,
            task.description_text().map(str::to_string),
            action,
            deps,
            name == self.root_task,
            self.signal.clone(),
        );

        debug!(task = %name, deps = ?node.dependency_names(), "registered task");

        self.indices.insert(name.clone(), index);
        self.nodes.insert(name.clone(), Arc::new(node));
        self.order.push(name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Node>> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name of the implicit root task.
    pub fn root_task(&self) -> &str {
        &self.root_task
    }

    /// Nodes in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.order.iter().filter_map(|name| self.nodes.get(name))
    }

    /// Task names ordered so that every task comes after its dependencies.
    pub fn execution_order(&self) -> Result<Vec<TaskName>> {
        let mut sorted = toposort(&self.graph, None).map_err(|cycle| {
            SlurpError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                self.graph[cycle.node_id()]
            ))
        })?;
        sorted.reverse();
        Ok(sorted.into_iter().map(|i| self.graph[i].clone()).collect())
    }

    /// Names of tasks whose action is currently executing.
    pub fn running_tasks(&self) -> Vec<TaskName> {
        self.tasks()
            .filter(|node| node.is_running())
            .map(|node| node.name().to_string())
            .collect()
    }
}
