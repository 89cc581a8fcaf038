//! Task invocations and their graph nodes
//!
//! A [`TaskInvocation`] is the immutable record of one `submit` call. While it
//! still waits on unresolved futures it lives inside a [`TaskNode`] in the
//! task graph.

use std::fmt;
use std::time::Instant;

use smallvec::SmallVec;

use super::builder::Arg;
use super::task_id::{EngineId, TaskId};
use crate::runtime::function::RemoteFunction;
use crate::runtime::future::FutureRef;

/// Dependency list of one node; most tasks await only a few futures.
pub type Dependencies = SmallVec<[TaskId; 4]>;

/// One submitted call of a remote function.
#[derive(Debug, Clone)]
pub struct TaskInvocation {
    id: TaskId,
    function: RemoteFunction,
    args: Vec<Arg>,
    submitted_at: Instant,
    future: FutureRef,
}

impl TaskInvocation {
    /// Create an invocation together with its pending future.
    pub(crate) fn new(owner: EngineId, id: TaskId, function: RemoteFunction, args: Vec<Arg>) -> Self {
        Self {
            id,
            function,
            args,
            submitted_at: Instant::now(),
            future: FutureRef::pending(owner, id),
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn function(&self) -> &RemoteFunction {
        &self.function
    }

    #[inline]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    #[inline]
    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    /// Future that receives this invocation's result.
    #[inline]
    pub fn future(&self) -> &FutureRef {
        &self.future
    }
}

/// An invocation parked in the graph until its dependencies resolve.
#[derive(Debug)]
pub struct TaskNode {
    invocation: TaskInvocation,
    /// Distinct futures this node awaits.
    dependencies: Dependencies,
    /// How many of `dependencies` are still unresolved.
    remaining: usize,
}

impl TaskNode {
    pub fn new(invocation: TaskInvocation, dependencies: Dependencies) -> Self {
        let remaining = dependencies.len();
        Self {
            invocation,
            dependencies,
            remaining,
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.invocation.id()
    }

    #[inline]
    pub fn invocation(&self) -> &TaskInvocation {
        &self.invocation
    }

    #[inline]
    pub fn into_invocation(self) -> TaskInvocation {
        self.invocation
    }

    #[inline]
    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }

    #[inline]
    pub fn depends_on(&self, future: TaskId) -> bool {
        self.dependencies.contains(&future)
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Record that one dependency resolved; returns `true` when none remain.
    ///
    /// # Panics
    ///
    /// Panics if called more often than the node has dependencies, which means
    /// the waiting index is corrupted.
    pub fn resolve_one(&mut self) -> bool {
        assert!(
            self.remaining > 0,
            "dependency count underflow for {}",
            self.id()
        );
        self.remaining -= 1;
        self.remaining == 0
    }
}

impl fmt::Display for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TaskNode({}: {}, {}/{} pending)",
            self.id(),
            self.invocation.function().name(),
            self.remaining,
            self.dependencies.len()
        )
    }
}
