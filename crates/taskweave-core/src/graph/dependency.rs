//! Dependency graph for one project's tasks.
//!
//! Design:
//! - Forward edges: task -> tasks it depends on, in stored order
//! - Reverse edges: task -> tasks that depend on it
//! - Invariant: edges and reverse_edges must be kept in sync
//! - Ids referenced by an edge but missing from the snapshot are "dangling":
//!   they stay in the forward list, are never expanded during reachability,
//!   and are never offered as targets

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::domain::{GraphError, ProjectId, TaskId, TaskSnapshot, TaskStatus};

/// DFS node colour used by [`DependencyGraph::find_cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

/// In-memory "depends-on" relation of one project, rebuilt from every fresh snapshot.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    project_id: ProjectId,

    /// Known task ids in snapshot order.
    order: Vec<TaskId>,

    statuses: HashMap<TaskId, TaskStatus>,

    /// Forward edges: task -> tasks it depends on (waits for)
    edges: HashMap<TaskId, Vec<TaskId>>,

    /// Reverse edges: task -> tasks that depend on it (waiting tasks)
    reverse_edges: HashMap<TaskId, BTreeSet<TaskId>>,
}

impl DependencyGraph {
    /// Create an empty graph for `project_id`.
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            order: Vec::new(),
            statuses: HashMap::new(),
            edges: HashMap::new(),
            reverse_edges: HashMap::new(),
        }
    }

    /// Build the graph from the project's current task list.
    ///
    /// Tasks belonging to another project are ignored. A repeated task id keeps
    /// its first occurrence.
    pub fn from_tasks<'a>(
        project_id: ProjectId,
        tasks: impl IntoIterator<Item = &'a TaskSnapshot>,
    ) -> Self {
        let mut graph = Self::new(project_id);
        for task in tasks {
            if task.project_id != graph.project_id {
                tracing::debug!(
                    task_id = %task.task_id,
                    project_id = %task.project_id,
                    "ignoring task from another project"
                );
                continue;
            }
            graph.insert_task(
                task.task_id.clone(),
                task.status,
                task.depending_on_tasks.clone(),
            );
        }
        graph
    }

    /// Build the graph from a plain `task -> dependencies` mapping.
    ///
    /// Every task gets status `Todo`.
    pub fn from_adjacency(
        project_id: ProjectId,
        adjacency: impl IntoIterator<Item = (TaskId, Vec<TaskId>)>,
    ) -> Self {
        let mut graph = Self::new(project_id);
        for (task_id, deps) in adjacency {
            graph.insert_task(task_id, TaskStatus::Todo, deps);
        }
        graph
    }

    fn insert_task(&mut self, task_id: TaskId, status: TaskStatus, deps: Vec<TaskId>) {
        if self.statuses.contains_key(&task_id) {
            return;
        }
        for dep in &deps {
            self.reverse_edges
                .entry(dep.clone())
                .or_default()
                .insert(task_id.clone());
        }
        self.statuses.insert(task_id.clone(), status);
        self.edges.insert(task_id.clone(), deps);
        self.order.push(task_id);
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `task` is part of the snapshot.
    pub fn contains(&self, task: &TaskId) -> bool {
        self.statuses.contains_key(task)
    }

    /// Known task ids in snapshot order.
    pub fn task_ids(&self) -> &[TaskId] {
        &self.order
    }

    /// Ordered dependency list of `task`, dangling entries included.
    pub fn dependencies_of(&self, task: &TaskId) -> &[TaskId] {
        self.edges.get(task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tasks that directly depend on `task`, sorted by id.
    pub fn dependents_of(&self, task: &TaskId) -> Vec<TaskId> {
        self.reverse_edges
            .get(task)
            .map(|waiting| waiting.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Existing dependencies of `task` that are not yet completed or cancelled.
    pub fn blocking_dependencies(&self, task: &TaskId) -> Vec<TaskId> {
        self.dependencies_of(task)
            .iter()
            .filter(|dep| {
                self.statuses
                    .get(*dep)
                    .is_some_and(|status| !status.is_resolved())
            })
            .cloned()
            .collect()
    }

    pub fn is_blocked(&self, task: &TaskId) -> bool {
        !self.blocking_dependencies(task).is_empty()
    }

    /// Entries of `task`'s dependency list that are not in the snapshot.
    pub fn dangling_dependencies(&self, task: &TaskId) -> Vec<TaskId> {
        self.dependencies_of(task)
            .iter()
            .filter(|dep| !self.contains(dep))
            .cloned()
            .collect()
    }

    /// Whether adding `from -> to` ("from depends on to") would close a cycle.
    ///
    /// True when `from == to`, or when `from` is reachable from `to`.
    /// Depth-first, O(V + E).
    pub fn would_create_cycle(&self, from: &TaskId, to: &TaskId) -> bool {
        if from == to {
            return true;
        }

        let mut visited: HashSet<&TaskId> = HashSet::new();
        let mut stack = vec![to];
        visited.insert(to);

        while let Some(node) = stack.pop() {
            // dangling ids are leaves
            if !self.contains(node) {
                continue;
            }
            for dep in self.dependencies_of(node) {
                if dep == from {
                    return true;
                }
                if visited.insert(dep) {
                    stack.push(dep);
                }
            }
        }
        false
    }

    /// Add `from -> to` and return `from`'s updated dependency list.
    ///
    /// Adding an edge that already exists returns the list unchanged.
    pub fn add_dependency(&mut self, from: &TaskId, to: &TaskId) -> Result<Vec<TaskId>, GraphError> {
        if from == to {
            tracing::debug!(task_id = %from, "rejecting self dependency");
            return Err(GraphError::CycleDetected {
                from: from.clone(),
                to: to.clone(),
            });
        }
        if !self.contains(from) {
            return Err(GraphError::UnknownTask(from.clone()));
        }
        if !self.contains(to) {
            return Err(GraphError::UnknownTask(to.clone()));
        }
        if self.dependencies_of(from).contains(to) {
            return Ok(self.dependencies_of(from).to_vec());
        }
        if self.would_create_cycle(from, to) {
            tracing::debug!(from = %from, to = %to, "rejecting dependency that closes a cycle");
            return Err(GraphError::CycleDetected {
                from: from.clone(),
                to: to.clone(),
            });
        }

        let deps = self.edges.entry(from.clone()).or_default();
        deps.push(to.clone());
        let updated = deps.clone();
        self.reverse_edges
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
        Ok(updated)
    }

    /// Remove `from -> to` and return `from`'s updated dependency list.
    ///
    /// Removing an edge can never introduce a cycle, so this always succeeds;
    /// removing a missing edge is a no-op.
    pub fn remove_dependency(&mut self, from: &TaskId, to: &TaskId) -> Vec<TaskId> {
        let Some(deps) = self.edges.get_mut(from) else {
            return Vec::new();
        };
        deps.retain(|dep| dep != to);
        let updated = deps.clone();

        if let Some(waiting) = self.reverse_edges.get_mut(to) {
            waiting.remove(from);
            if waiting.is_empty() {
                self.reverse_edges.remove(to);
            }
        }
        updated
    }

    /// Drop every dangling entry from `task`'s list and return the cleaned list.
    pub fn prune_dangling(&mut self, task: &TaskId) -> Vec<TaskId> {
        for dangling in self.dangling_dependencies(task) {
            self.remove_dependency(task, &dangling);
        }
        self.dependencies_of(task).to_vec()
    }

    /// Tasks that may be added as a dependency of `task`, in snapshot order.
    ///
    /// Excludes `task` itself, its current dependencies, and every task that
    /// (transitively) depends on `task`. A task id not in the snapshot (e.g. one
    /// still being created) may still be referenced as a dangling dependency;
    /// the tasks holding that reference and their dependents stay excluded,
    /// matching [`would_create_cycle`](Self::would_create_cycle).
    pub fn available_dependency_targets(&self, task: &TaskId) -> Vec<TaskId> {
        let upstream = self.transitive_dependents(task);
        let current: HashSet<&TaskId> = self.dependencies_of(task).iter().collect();

        self.order
            .iter()
            .filter(|candidate| *candidate != task)
            .filter(|candidate| !current.contains(candidate))
            .filter(|candidate| !upstream.contains(candidate))
            .cloned()
            .collect()
    }

    /// Every task from which `task` is reachable, i.e. whose addition as a
    /// dependency of `task` would close a cycle.
    fn transitive_dependents(&self, task: &TaskId) -> HashSet<&TaskId> {
        let mut seen: HashSet<&TaskId> = HashSet::new();
        let mut stack = vec![task];
        while let Some(node) = stack.pop() {
            if let Some(waiting) = self.reverse_edges.get(node) {
                for dependent in waiting {
                    if seen.insert(dependent) {
                        stack.push(dependent);
                    }
                }
            }
        }
        seen
    }

    /// Detect a cycle already present in the loaded snapshot.
    ///
    /// Returns one cycle as a path that starts and ends with the same task
    /// (e.g. `[a, b, a]`), or `None` if the graph is acyclic.
    pub fn find_cycle(&self) -> Option<Vec<TaskId>> {
        let mut colors: HashMap<&TaskId, Color> = HashMap::new();

        for start in &self.order {
            if colors.contains_key(start) {
                continue;
            }

            // (node, index of the next dependency to visit)
            let mut stack: Vec<(&TaskId, usize)> = vec![(start, 0)];
            colors.insert(start, Color::Gray);

            while let Some(&(node, next)) = stack.last() {
                let deps = self.dependencies_of(node);
                if next >= deps.len() {
                    colors.insert(node, Color::Black);
                    stack.pop();
                    continue;
                }
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let dep = &deps[next];

                if !self.contains(dep) {
                    continue;
                }
                match colors.get(dep) {
                    Some(Color::Gray) => {
                        let begin = stack
                            .iter()
                            .position(|(n, _)| *n == dep)
                            .unwrap_or_default();
                        let mut cycle: Vec<TaskId> =
                            stack[begin..].iter().map(|(n, _)| (*n).clone()).collect();
                        cycle.push(dep.clone());
                        return Some(cycle);
                    }
                    Some(Color::Black) => {}
                    None => {
                        colors.insert(dep, Color::Gray);
                        stack.push((dep, 0));
                    }
                }
            }
        }
        None
    }
}
