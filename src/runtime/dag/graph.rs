//! The waiting side of the task graph
//!
//! `TaskGraph` holds every invocation that still awaits at least one future,
//! indexed by the futures it awaits. Resolving a future hands back the
//! invocations that became ready; failing a future hands back its direct
//! dependents so the scheduler can fail them in turn.

use std::collections::HashMap;

use smallvec::SmallVec;

use super::node::{Dependencies, TaskInvocation, TaskNode};
use super::task_id::TaskId;

/// Waiting invocations keyed by id, plus the reverse index future -> waiters.
#[derive(Debug, Default)]
pub struct TaskGraph {
    nodes: HashMap<TaskId, TaskNode>,
    waiters: HashMap<TaskId, SmallVec<[TaskId; 4]>>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park an invocation until every future in `dependencies` resolves.
    ///
    /// `dependencies` must be non-empty and free of duplicates.
    pub fn insert(&mut self, invocation: TaskInvocation, dependencies: Dependencies) {
        debug_assert!(!dependencies.is_empty(), "ready tasks do not enter the graph");
        let id = invocation.id();
        for &dependency in &dependencies {
            self.waiters.entry(dependency).or_default().push(id);
        }
        self.nodes.insert(id, TaskNode::new(invocation, dependencies));
    }

    /// A future resolved; returns invocations whose last dependency it was.
    pub fn resolve(&mut self, future: TaskId) -> Vec<TaskInvocation> {
        let mut ready = Vec::new();
        let Some(waiting) = self.waiters.remove(&future) else {
            return ready;
        };

        for task in waiting {
            let Some(node) = self.nodes.get_mut(&task) else {
                continue;
            };
            if node.resolve_one() {
                if let Some(node) = self.nodes.remove(&task) {
                    ready.push(node.into_invocation());
                }
            }
        }
        ready
    }

    /// A future failed; removes and returns its direct dependents.
    ///
    /// Transitive dependents stay until the caller fails each returned
    /// invocation's own future.
    pub fn fail(&mut self, future: TaskId) -> Vec<TaskInvocation> {
        let Some(waiting) = self.waiters.remove(&future) else {
            return Vec::new();
        };

        waiting
            .into_iter()
            .filter_map(|task| self.remove(task))
            .collect()
    }

    /// Remove a waiting invocation and unlink it from every index entry.
    pub fn remove(&mut self, task: TaskId) -> Option<TaskInvocation> {
        let node = self.nodes.remove(&task)?;
        for dependency in node.dependencies() {
            if let Some(list) = self.waiters.get_mut(dependency) {
                list.retain(|waiter| *waiter != task);
                if list.is_empty() {
                    self.waiters.remove(dependency);
                }
            }
        }
        Some(node.into_invocation())
    }

    /// Remove every waiting invocation, oldest first.
    pub fn drain(&mut self) -> Vec<TaskInvocation> {
        self.waiters.clear();
        let mut invocations: Vec<_> = self
            .nodes
            .drain()
            .map(|(_, node)| node.into_invocation())
            .collect();
        invocations.sort_by_key(TaskInvocation::id);
        invocations
    }

    #[inline]
    pub fn contains(&self, task: TaskId) -> bool {
        self.nodes.contains_key(&task)
    }

    pub fn get(&self, task: TaskId) -> Option<&TaskNode> {
        self.nodes.get(&task)
    }

    /// Number of invocations waiting on `future`.
    pub fn waiters_of(&self, future: TaskId) -> usize {
        self.waiters.get(&future).map_or(0, |list| list.len())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
